// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! End-to-end flows over the relayer manager with a scripted SDK and wallet.

use alloy_primitives::Address;
use std::sync::Arc;
use zl_config::SdkDiscoveryConfig;
use zl_relayer::{
    RelayerError, RelayerManager, RelayerSettings, SdkRegistry, WalletDirectory,
};
use zl_test_helpers::{MockSdk, MockWallet, PayloadShape};

const CONTRACT: &str = "0x95E8250c6cc42148d8D067C1AAF6b6d961be338f";
const USER: &str = "0x1111111111111111111111111111111111111111";

fn test_settings() -> RelayerSettings {
    RelayerSettings {
        chain_id: 11155111,
        network_name: "sepolia".to_string(),
        relayer_url: Some("https://relayer.example.com".to_string()),
        gateway_chain_id: Some(55815),
        discovery: SdkDiscoveryConfig {
            candidates: vec!["fhevm".to_string()],
            attempts: 3,
            delay_ms: 5,
        },
    }
}

async fn manager_with_mocks() -> (Arc<RelayerManager>, Arc<MockSdk>, Arc<MockWallet>) {
    let registry = SdkRegistry::new();
    let sdk = MockSdk::new();
    registry.register("fhevm", sdk.clone()).await;

    let wallets = WalletDirectory::new();
    let wallet = MockWallet::new(Address::repeat_byte(0x11));
    wallets.set_injected(wallet.clone()).await;

    let manager = RelayerManager::new(registry, wallets, test_settings());
    (manager, sdk, wallet)
}

#[tokio::test]
async fn sdk_initializes_exactly_once_under_concurrent_callers() {
    let (manager, sdk, _) = manager_with_mocks().await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let manager = manager.clone();
        handles.push(tokio::spawn(async move { manager.ensure_sdk().await }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }

    assert_eq!(sdk.init_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn discovery_picks_up_a_late_registration() {
    let registry = SdkRegistry::new();
    let wallets = WalletDirectory::new();
    let mut settings = test_settings();
    settings.discovery.attempts = 20;
    let manager = RelayerManager::new(registry.clone(), wallets, settings);

    let sdk = MockSdk::new();
    let late_sdk = sdk.clone();
    tokio::spawn(async move {
        tokio::time::sleep(tokio::time::Duration::from_millis(30)).await;
        registry.register("fhevm", late_sdk).await;
    });

    assert!(manager.ensure_sdk().await.is_ok());
    assert_eq!(sdk.init_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[tokio::test]
async fn discovery_gives_up_after_the_attempt_budget() {
    let registry = SdkRegistry::new();
    let wallets = WalletDirectory::new();
    let mut settings = test_settings();
    settings.discovery.attempts = 2;
    settings.discovery.delay_ms = 1;
    let manager = RelayerManager::new(registry, wallets, settings);

    match manager.ensure_sdk().await {
        Err(RelayerError::SdkNotFound { attempts }) => assert_eq!(attempts, 2),
        Err(err) => panic!("expected SdkNotFound, got {err}"),
        Ok(_) => panic!("expected SdkNotFound, got an SDK handle"),
    }
}

#[tokio::test]
async fn instance_is_reused_until_the_configuration_signature_changes() {
    let (manager, sdk, _) = manager_with_mocks().await;

    manager.ensure_instance(true).await.unwrap();
    manager.ensure_instance(true).await.unwrap();
    assert_eq!(
        sdk.instances_created.load(std::sync::atomic::Ordering::SeqCst),
        1
    );

    let mut settings = manager.settings().await;
    settings.gateway_chain_id = Some(412346);
    manager.update_settings(settings).await;

    manager.ensure_instance(true).await.unwrap();
    assert_eq!(
        sdk.instances_created.load(std::sync::atomic::Ordering::SeqCst),
        2
    );
    let configs = sdk.instance_configs.lock().unwrap();
    assert_eq!(configs[0].1, 55815);
    assert_eq!(configs[1].1, 412346);
}

#[tokio::test]
async fn instance_rebuild_without_relayer_config_is_an_error() {
    let (manager, _, _) = manager_with_mocks().await;
    let mut settings = manager.settings().await;
    settings.relayer_url = None;
    manager.update_settings(settings).await;

    assert!(matches!(
        manager.ensure_instance(true).await,
        Err(RelayerError::MissingConfig)
    ));
}

#[tokio::test]
async fn encrypt_returns_canonical_hex_for_both_payload_shapes() {
    for shape in [PayloadShape::HexStrings, PayloadShape::RawBytes] {
        let (manager, sdk, _) = manager_with_mocks().await;
        manager.ensure_instance(true).await.unwrap();
        sdk.last_instance_state().unwrap().return_shape(shape);

        let payload = manager
            .encrypt_uint64(CONTRACT, USER, 1_000_000, "contribute")
            .await
            .unwrap();

        for field in [&payload.data, &payload.proof] {
            assert!(field.starts_with("0x"), "{field} not 0x-prefixed");
            let digits = &field[2..];
            assert_eq!(digits.len() % 2, 0);
            assert!(digits
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b)));
        }
    }
}

#[tokio::test]
async fn encrypt_sends_the_audit_envelope_on_the_first_attempt() {
    let (manager, sdk, _) = manager_with_mocks().await;
    manager
        .encrypt_uint64(CONTRACT, USER, 42, "contribute")
        .await
        .unwrap();

    let envelopes = sdk.last_instance_state().unwrap().envelopes_seen();
    assert_eq!(envelopes.len(), 1);
    let extra = envelopes[0].as_ref().unwrap();
    assert_eq!(extra.function, "contribute");
    assert_eq!(extra.arg_types, vec!["euint64".to_string()]);
    assert_eq!(extra.chain_id, 11155111);
    assert_eq!(extra.gateway_chain_id, 55815);
    // Addresses ride in checksummed form
    assert_eq!(extra.contract_address, CONTRACT);
}

#[tokio::test]
async fn encrypt_falls_back_to_legacy_format_on_generic_failure() {
    let (manager, sdk, _) = manager_with_mocks().await;
    manager.ensure_instance(true).await.unwrap();
    let state = sdk.last_instance_state().unwrap();
    state.fail_extra_data_attempt("relayer rejected the request");

    let payload = manager
        .encrypt_uint64(CONTRACT, USER, 42, "contribute")
        .await
        .unwrap();
    assert!(payload.data.starts_with("0x"));

    let envelopes = state.envelopes_seen();
    assert_eq!(envelopes.len(), 2);
    assert!(envelopes[0].is_some());
    assert!(envelopes[1].is_none());
}

#[tokio::test]
async fn missing_extra_data_complaint_is_a_hard_version_mismatch() {
    let (manager, sdk, _) = manager_with_mocks().await;
    manager.ensure_instance(true).await.unwrap();
    let state = sdk.last_instance_state().unwrap();
    state.fail_extra_data_attempt("Missing field 'extraData' in request body");

    let err = manager
        .encrypt_uint64(CONTRACT, USER, 42, "contribute")
        .await
        .unwrap_err();
    assert!(matches!(err, RelayerError::ExtraDataRequired));
    // No legacy retry after the version-mismatch diagnosis
    assert_eq!(state.envelopes_seen().len(), 1);
}

#[tokio::test]
async fn encrypt_surfaces_failures_of_both_attempts() {
    let (manager, sdk, _) = manager_with_mocks().await;
    manager.ensure_instance(true).await.unwrap();
    sdk.last_instance_state()
        .unwrap()
        .fail_every_attempt("relayer unavailable");

    let err = manager
        .encrypt_uint64(CONTRACT, USER, 42, "contribute")
        .await
        .unwrap_err();
    assert!(matches!(err, RelayerError::EncryptionFailed { .. }));
}

#[tokio::test]
async fn encrypt_validates_inputs_before_touching_the_sdk() {
    let (manager, sdk, _) = manager_with_mocks().await;

    let err = manager
        .encrypt_uint64(CONTRACT, USER, u128::from(u64::MAX) + 1, "contribute")
        .await
        .unwrap_err();
    assert!(matches!(err, RelayerError::ValueOutOfRange(_)));

    let err = manager
        .encrypt_uint64("0xnope", USER, 42, "contribute")
        .await
        .unwrap_err();
    assert!(matches!(err, RelayerError::InvalidAddress(_)));

    assert_eq!(sdk.init_calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[tokio::test]
async fn user_decrypt_round_trip_parses_the_plaintext() {
    let (manager, sdk, wallet) = manager_with_mocks().await;
    manager.ensure_instance(true).await.unwrap();
    let state = sdk.last_instance_state().unwrap();
    state.set_decrypt_result("0xhandle01", "1500000000000000000");

    let value = manager
        .user_decrypt_uint64(CONTRACT, "0xhandle01")
        .await
        .unwrap();
    assert_eq!(value, 1_500_000_000_000_000_000);
    assert_eq!(wallet.signature_count(), 1);

    let requests = state.decrypt_requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.duration_days, 1);
    assert!(!request.signature_no_0x.starts_with("0x"));
    assert_eq!(request.contract_addresses, vec![CONTRACT.to_string()]);
    assert_eq!(request.pairs[0].handle, "0xhandle01");
}

#[tokio::test]
async fn each_decryption_uses_a_fresh_keypair() {
    let (manager, sdk, wallet) = manager_with_mocks().await;
    manager.ensure_instance(true).await.unwrap();
    let state = sdk.last_instance_state().unwrap();
    state.set_decrypt_result("0xhandle01", "0x2a");

    manager.user_decrypt_uint64(CONTRACT, "0xhandle01").await.unwrap();
    manager.user_decrypt_uint64(CONTRACT, "0xhandle01").await.unwrap();

    let requests = state.decrypt_requests.lock().unwrap();
    assert_ne!(requests[0].public_key, requests[1].public_key);
    assert_ne!(requests[0].private_key, requests[1].private_key);
    drop(requests);

    // Both authorizations were individually signed
    assert_eq!(wallet.signature_count(), 2);
    let payloads = wallet.signed_payloads.lock().unwrap();
    assert_eq!(payloads[0]["primaryType"], "UserDecryptRequestVerification");
}

#[tokio::test]
async fn missing_decryption_result_is_reported_with_the_handle() {
    let (manager, sdk, _) = manager_with_mocks().await;
    manager.ensure_instance(true).await.unwrap();
    sdk.last_instance_state()
        .unwrap()
        .set_decrypt_result("0xother", "7");

    let err = manager
        .user_decrypt_uint64(CONTRACT, "0xhandle01")
        .await
        .unwrap_err();
    match err {
        RelayerError::DecryptionResultMissing(handle) => assert_eq!(handle, "0xhandle01"),
        other => panic!("expected DecryptionResultMissing, got {other:?}"),
    }
}

#[tokio::test]
async fn decrypt_requires_an_unlocked_wallet_account() {
    let registry = SdkRegistry::new();
    let sdk = MockSdk::new();
    registry.register("fhevm", sdk.clone()).await;
    let wallets = WalletDirectory::new();
    wallets.set_injected(MockWallet::locked()).await;
    let manager = RelayerManager::new(registry, wallets, test_settings());

    let err = manager
        .user_decrypt_uint64(CONTRACT, "0xhandle01")
        .await
        .unwrap_err();
    assert!(matches!(err, RelayerError::NoWalletAccount));
}

#[tokio::test]
async fn wallet_rejection_propagates_as_a_wallet_error() {
    let (manager, sdk, wallet) = manager_with_mocks().await;
    manager.ensure_instance(true).await.unwrap();
    sdk.last_instance_state()
        .unwrap()
        .set_decrypt_result("0xhandle01", "7");
    wallet.reject_next_signature(true);

    let err = manager
        .user_decrypt_uint64(CONTRACT, "0xhandle01")
        .await
        .unwrap_err();
    assert!(matches!(err, RelayerError::Wallet(_)));
}

#[tokio::test]
async fn repeated_encryption_keeps_the_payload_structure() {
    let (manager, sdk, _) = manager_with_mocks().await;

    let first = manager
        .encrypt_uint64(CONTRACT, USER, 42, "contribute")
        .await
        .unwrap();
    let second = manager
        .encrypt_uint64(CONTRACT, USER, 42, "contribute")
        .await
        .unwrap();

    // Ciphertexts may differ run to run, but the normalized shape never does.
    for payload in [&first, &second] {
        assert!(payload.data.starts_with("0x"));
        assert!(payload.proof.starts_with("0x"));
        assert_eq!(payload.data.len() % 2, 0);
        assert_eq!(payload.proof.len() % 2, 0);
    }
    // Two encryptions share one SDK init and one instance.
    assert_eq!(sdk.init_calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert_eq!(
        sdk.instances_created.load(std::sync::atomic::Ordering::SeqCst),
        1
    );
}

#[tokio::test]
async fn concurrent_callers_share_one_instance_build() {
    let (manager, sdk, _) = manager_with_mocks().await;

    let mut handles = Vec::new();
    for _ in 0..8 {
        let manager = manager.clone();
        handles.push(tokio::spawn(
            async move { manager.ensure_instance(true).await },
        ));
    }
    for handle in handles {
        assert!(handle.await.unwrap().is_ok());
    }

    assert_eq!(
        sdk.instances_created.load(std::sync::atomic::Ordering::SeqCst),
        1
    );
}
