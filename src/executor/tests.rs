//! Executor module tests

use super::dispatch::{ExecutorCall, ExecutorFunction};
use super::*;
use crate::abi::{AbiDecoder, AbiEncoder, AbiType, AbiValue, U256};
use crate::message_signer::{HashSigner, LocalSigner};
use crate::types::{Address, KeyId, PkpInfo, B256};
use crate::utils::config::ExecutorConfig;

const OWNER_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
const OTHER_KEY: &str = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";
const MODULE: &str = "0x5FbDB2315678afecb367f032d93F642f64180aa3";

fn addr(byte: u8) -> Address {
    Address([byte; 20])
}

fn module() -> ExecutorModule {
    let config = ExecutorConfig::new(84532, MODULE.parse().unwrap());
    ExecutorModule::new(config).unwrap()
}

fn owner() -> LocalSigner {
    LocalSigner::from_hex(OWNER_KEY).unwrap()
}

fn sign(module: &ExecutorModule, signer: &LocalSigner, account: Address, target: Address, value: U256, data: &[u8]) -> Vec<u8> {
    let hash = module.get_operation_hash(&account, &target, &value, data);
    signer.sign_hash(&hash).unwrap().to_bytes().to_vec()
}

fn installed() -> (ExecutorModule, LocalSigner) {
    let module = module();
    let signer = owner();
    module.install(addr(1), signer.address(), KeyId::from([0x42; 32])).unwrap();
    (module, signer)
}

#[test]
fn test_install_records_and_emits() {
    let (module, signer) = installed();

    let info = module.get_pkp_info(&addr(1));
    assert_eq!(info, PkpInfo::new(signer.address(), KeyId::from([0x42; 32])));
    assert!(module.is_module_installed(&addr(1), 2));
    assert_eq!(module.account_for_signer(&signer.address()), Some(addr(1)));

    assert_eq!(
        module.logs(),
        vec![ModuleEvent::ModuleInstalled {
            account: addr(1),
            signer_address: signer.address(),
            key_id: KeyId::from([0x42; 32]),
        }]
    );
}

#[test]
fn test_is_module_installed_filters_type() {
    let (module, _) = installed();
    assert!(!module.is_module_installed(&addr(1), 1));
    assert!(!module.is_module_installed(&addr(1), 4));
    assert!(!module.is_module_installed(&addr(2), 2));

    assert!(module.is_module_type(2));
    assert!(!module.is_module_type(1));
}

#[test]
fn test_failed_install_leaves_state_untouched() {
    let (module, signer) = installed();
    let before = module.get_pkp_info(&addr(1));

    assert_eq!(
        module.install(addr(1), addr(0x99), KeyId::ZERO),
        Err(ExecutorError::AlreadyInstalled)
    );
    assert_eq!(
        module.install(addr(2), signer.address(), KeyId::ZERO),
        Err(ExecutorError::UnauthorizedSigner)
    );

    assert_eq!(module.get_pkp_info(&addr(1)), before);
    assert!(!module.is_module_installed(&addr(2), 2));
    assert_eq!(module.logs().len(), 1);
}

#[test]
fn test_uninstall() {
    let (module, signer) = installed();
    module.uninstall(addr(1)).unwrap();

    assert_eq!(module.get_pkp_info(&addr(1)), PkpInfo::default());
    assert_eq!(module.account_for_signer(&signer.address()), None);
    assert_eq!(
        module.logs().last(),
        Some(&ModuleEvent::ModuleUninstalled {
            account: addr(1),
            signer_address: signer.address(),
        })
    );

    assert_eq!(module.uninstall(addr(1)), Err(ExecutorError::NotInstalled));
    module.install(addr(2), signer.address(), KeyId::ZERO).unwrap();
}

#[test]
fn test_execute_round_trip() {
    let (module, signer) = installed();
    let data = vec![0xa9, 0x05, 0x9c, 0xbb];
    let value = U256::from(10);
    let sig = sign(&module, &signer, addr(1), addr(2), value, &data);

    let mut forwarder = RecordingForwarder::succeeding(vec![0x01]);
    let output = module
        .execute_from_executor(addr(1), addr(2), value, &data, &sig, &mut forwarder)
        .unwrap();

    assert_eq!(output, vec![0x01]);
    assert_eq!(forwarder.calls().len(), 1);
    let call = &forwarder.calls()[0];
    assert_eq!(call.module, module.address());
    assert_eq!(call.account, addr(1));
    assert_eq!(call.target, addr(2));
    assert_eq!(call.value, value);
    assert_eq!(call.data, data);

    let hash = module.get_operation_hash(&addr(1), &addr(2), &value, &data);
    let logs = module.logs();
    assert_eq!(logs.len(), 3);
    assert_eq!(
        logs[1],
        ModuleEvent::PkpSignatureVerified {
            account: addr(1),
            operation_hash: hash,
            signer_address: signer.address(),
        }
    );
    assert_eq!(
        logs[2],
        ModuleEvent::OperationExecuted {
            account: addr(1),
            target: addr(2),
            value,
            data,
        }
    );
    assert!(!module.is_executing());
}

#[test]
fn test_execute_wrong_signer() {
    let (module, _) = installed();
    let intruder = LocalSigner::from_hex(OTHER_KEY).unwrap();
    let sig = sign(&module, &intruder, addr(1), addr(2), U256::ZERO, b"");

    let mut forwarder = RecordingForwarder::default();
    let err = module
        .execute_from_executor(addr(1), addr(2), U256::ZERO, b"", &sig, &mut forwarder)
        .unwrap_err();

    assert!(matches!(err, ExecutorError::InvalidSignature(_)));
    assert!(forwarder.calls().is_empty());
    assert_eq!(module.logs().len(), 1);
}

#[test]
fn test_execute_signature_for_other_operation() {
    let (module, signer) = installed();
    let sig = sign(&module, &signer, addr(1), addr(2), U256::ZERO, b"");

    let mut forwarder = RecordingForwarder::default();
    let err = module
        .execute_from_executor(addr(1), addr(2), U256::ONE, b"", &sig, &mut forwarder)
        .unwrap_err();
    assert!(matches!(err, ExecutorError::InvalidSignature(_)));
}

#[test]
fn test_signature_not_replayable_on_other_chain() {
    let (module, signer) = installed();
    let other_config = ExecutorConfig::new(1, MODULE.parse().unwrap());
    let other = ExecutorModule::new(other_config).unwrap();
    other.install(addr(1), signer.address(), KeyId::ZERO).unwrap();

    let sig = sign(&module, &signer, addr(1), addr(2), U256::ZERO, b"");
    let err = other
        .execute_from_executor(addr(1), addr(2), U256::ZERO, b"", &sig, &mut RecordingForwarder::default())
        .unwrap_err();
    assert!(matches!(err, ExecutorError::InvalidSignature(_)));
}

#[test]
fn test_malformed_signatures() {
    let (module, signer) = installed();
    let good = sign(&module, &signer, addr(1), addr(2), U256::ZERO, b"");
    let mut forwarder = RecordingForwarder::default();

    let mut bad_v = good.clone();
    bad_v[64] = 29;
    let mut zero_r = good.clone();
    zero_r[..32].fill(0);

    for sig in [&good[..64], &[][..], &bad_v[..], &zero_r[..]] {
        let err = module
            .execute_from_executor(addr(1), addr(2), U256::ZERO, b"", sig, &mut forwarder)
            .unwrap_err();
        assert!(matches!(err, ExecutorError::InvalidSignature(_)));
    }
    assert!(forwarder.calls().is_empty());
}

#[test]
fn test_high_s_twin_rejected() {
    let (module, signer) = installed();
    let good = sign(&module, &signer, addr(1), addr(2), U256::ZERO, b"");

    // (r, n - s, v ^ 1) recovers the same key but is malleable
    let n = U256::from_hex("0xfffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141").unwrap();
    let s = U256::from_be_bytes(&good[32..64]);
    let mut twin = good.clone();
    twin[32..64].copy_from_slice(&n.checked_sub(s).unwrap().to_be_bytes());
    twin[64] = if good[64] == 27 { 28 } else { 27 };

    let err = module
        .execute_from_executor(addr(1), addr(2), U256::ZERO, b"", &twin, &mut RecordingForwarder::default())
        .unwrap_err();
    assert!(matches!(err, ExecutorError::InvalidSignature(_)));
}

#[test]
fn test_execute_not_installed() {
    let module = module();
    let signer = owner();
    let sig = sign(&module, &signer, addr(1), addr(2), U256::ZERO, b"");

    let err = module
        .execute_from_executor(addr(1), addr(2), U256::ZERO, b"", &sig, &mut RecordingForwarder::default())
        .unwrap_err();
    assert_eq!(err, ExecutorError::NotInstalled);
    assert!(module.logs().is_empty());
}

#[test]
fn test_forwarded_failure_reverts_everything() {
    let (module, signer) = installed();
    let sig = sign(&module, &signer, addr(1), addr(2), U256::ZERO, b"");

    // Target uninstalls the account and installs another before reverting
    let mut forwarder = |module: &ExecutorModule, call: &ForwardedCall| -> Result<Vec<u8>, CallFailure> {
        module.uninstall(call.account).unwrap();
        module.install(addr(7), addr(0x77), KeyId::ZERO).unwrap();
        Err(CallFailure::new(vec![0x08, 0xc3, 0x79, 0xa0]))
    };

    let err = module
        .execute_from_executor(addr(1), addr(2), U256::ZERO, b"", &sig, &mut forwarder)
        .unwrap_err();

    assert_eq!(
        err,
        ExecutorError::ExecutionFailed {
            revert_data: vec![0x08, 0xc3, 0x79, 0xa0]
        }
    );
    assert!(module.is_module_installed(&addr(1), 2));
    assert!(!module.is_module_installed(&addr(7), 2));
    assert_eq!(module.logs().len(), 1);
    assert!(!module.is_executing());
}

#[test]
fn test_events_held_until_execution_commits() {
    let (module, signer) = installed();
    let sig = sign(&module, &signer, addr(1), addr(2), U256::ZERO, b"");

    let mut seen_inside = Vec::new();
    let mut forwarder = |module: &ExecutorModule, _: &ForwardedCall| -> Result<Vec<u8>, CallFailure> {
        module.install(addr(7), addr(0x77), KeyId::ZERO).unwrap();
        seen_inside = module.logs();
        Ok(Vec::new())
    };

    module
        .execute_from_executor(addr(1), addr(2), U256::ZERO, b"", &sig, &mut forwarder)
        .unwrap();

    let names = |events: &[ModuleEvent]| events.iter().map(ModuleEvent::name).collect::<Vec<_>>();
    assert_eq!(names(&seen_inside), ["ModuleInstalled"]);
    assert_eq!(
        names(&module.logs()),
        ["ModuleInstalled", "PKPSignatureVerified", "ModuleInstalled", "OperationExecuted"]
    );
}

#[test]
fn test_drain_during_execution_skips_uncommitted_events() {
    let (module, signer) = installed();
    let sig = sign(&module, &signer, addr(1), addr(2), U256::ZERO, b"");

    let mut drained = Vec::new();
    let mut forwarder = |module: &ExecutorModule, _: &ForwardedCall| -> Result<Vec<u8>, CallFailure> {
        drained = module.take_logs();
        Err(CallFailure::new(Vec::new()))
    };

    let err = module
        .execute_from_executor(addr(1), addr(2), U256::ZERO, b"", &sig, &mut forwarder)
        .unwrap_err();

    assert!(matches!(err, ExecutorError::ExecutionFailed { .. }));
    assert_eq!(drained.len(), 1);
    assert!(matches!(drained[0], ModuleEvent::ModuleInstalled { .. }));
    assert!(module.logs().is_empty());
}

#[test]
fn test_other_threads_wait_for_execution_to_settle() {
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    let (module, signer) = installed();
    let other = LocalSigner::from_hex(OTHER_KEY).unwrap();
    let sig = sign(&module, &signer, addr(1), addr(2), U256::ZERO, b"");
    let other_sig = sign(&module, &other, addr(3), addr(4), U256::ZERO, b"");
    let (started_tx, started_rx) = mpsc::channel();

    let (outer, (concurrent_install, concurrent_execute)) = thread::scope(|s| {
        let (module_ref, other_ref, other_sig_ref) = (&module, &other, &other_sig);
        let worker = s.spawn(move || {
            started_rx.recv().unwrap();
            let installed = module_ref.install(addr(3), other_ref.address(), KeyId::ZERO);
            let executed = module_ref.execute_from_executor(
                addr(3),
                addr(4),
                U256::ZERO,
                b"",
                other_sig_ref,
                &mut RecordingForwarder::default(),
            );
            (installed, executed)
        });

        // Target stalls, then reverts, while the worker is already waiting
        let mut forwarder = |_: &ExecutorModule, _: &ForwardedCall| -> Result<Vec<u8>, CallFailure> {
            started_tx.send(()).unwrap();
            thread::sleep(Duration::from_millis(50));
            Err(CallFailure::new(Vec::new()))
        };
        let outer = module.execute_from_executor(addr(1), addr(2), U256::ZERO, b"", &sig, &mut forwarder);
        (outer, worker.join().unwrap())
    });

    assert_eq!(outer, Err(ExecutorError::ExecutionFailed { revert_data: Vec::new() }));
    assert_eq!(concurrent_install, Ok(()));
    assert!(concurrent_execute.is_ok());

    assert!(module.is_module_installed(&addr(1), 2));
    assert!(module.is_module_installed(&addr(3), 2));
    let names: Vec<&str> = module.logs().iter().map(ModuleEvent::name).collect();
    assert_eq!(
        names,
        ["ModuleInstalled", "ModuleInstalled", "PKPSignatureVerified", "OperationExecuted"]
    );
}

#[test]
fn test_reentrant_call_caught_by_target() {
    let (module, signer) = installed();
    let sig = sign(&module, &signer, addr(1), addr(2), U256::ZERO, b"");
    let replay = sig.clone();

    let mut inner = None;
    let mut forwarder = |module: &ExecutorModule, call: &ForwardedCall| -> Result<Vec<u8>, CallFailure> {
        inner = Some(module.execute_from_executor(
            call.account,
            call.target,
            call.value,
            &call.data,
            &replay,
            &mut RecordingForwarder::default(),
        ));
        Ok(Vec::new())
    };

    module
        .execute_from_executor(addr(1), addr(2), U256::ZERO, b"", &sig, &mut forwarder)
        .unwrap();

    assert_eq!(inner, Some(Err(ExecutorError::ReentrantCall)));
    let executed = module
        .logs()
        .iter()
        .filter(|e| matches!(e, ModuleEvent::OperationExecuted { .. }))
        .count();
    assert_eq!(executed, 1);
}

#[test]
fn test_reentrant_call_propagated_by_target() {
    let (module, signer) = installed();
    let sig = sign(&module, &signer, addr(1), addr(2), U256::ZERO, b"");
    let replay = sig.clone();

    let mut forwarder = |module: &ExecutorModule, call: &ForwardedCall| -> Result<Vec<u8>, CallFailure> {
        module
            .execute_from_executor(
                call.account,
                call.target,
                call.value,
                &call.data,
                &replay,
                &mut RecordingForwarder::default(),
            )
            .map_err(|e| CallFailure::new(e.revert_data()))
    };

    let err = module
        .execute_from_executor(addr(1), addr(2), U256::ZERO, b"", &sig, &mut forwarder)
        .unwrap_err();

    assert_eq!(
        err,
        ExecutorError::ExecutionFailed {
            revert_data: ExecutorError::ReentrantCall.revert_data()
        }
    );
    assert_eq!(module.logs().len(), 1);

    // Gate is open again
    module
        .execute_from_executor(addr(1), addr(2), U256::ZERO, b"", &sig, &mut RecordingForwarder::default())
        .unwrap();
}

#[test]
fn test_revert_data_selectors() {
    assert_eq!(hex::encode(ExecutorError::AlreadyInstalled.revert_data()), "4870eaf9");
    assert_eq!(hex::encode(ExecutorError::UnauthorizedSigner.revert_data()), "ca31867a");
    assert_eq!(hex::encode(ExecutorError::NotInstalled.revert_data()), "2c283ef6");
    assert_eq!(
        hex::encode(ExecutorError::InvalidSignature(String::new()).revert_data()),
        "8baa579f"
    );
    assert_eq!(hex::encode(ExecutorError::ReentrantCall.revert_data()), "3ee5aeb5");
    assert!(ExecutorError::InvalidCalldata(String::new()).revert_data().is_empty());
}

#[test]
fn test_on_install_decodes_init_data() {
    let module = module();
    let init = AbiEncoder::encode_values(&[AbiValue::Address([0xaa; 20]), AbiValue::FixedBytes([0x01; 32])]);
    module.on_install(addr(1), &init).unwrap();

    let info = module.get_pkp_info(&addr(1));
    assert_eq!(info.signer_address, addr(0xaa));
    assert_eq!(info.key_id, B256([0x01; 32]));

    module.on_uninstall(addr(1), &[]).unwrap();
    assert!(!module.get_pkp_info(&addr(1)).installed);
}

#[test]
fn test_on_install_rejects_short_init_data() {
    let module = module();
    assert!(matches!(
        module.on_install(addr(1), &[0u8; 10]),
        Err(ExecutorError::InvalidCalldata(_))
    ));
    assert!(module.logs().is_empty());
}

#[test]
fn test_on_install_rejects_missing_key_id() {
    let module = module();
    let init = AbiEncoder::encode_values(&[AbiValue::Address([0xaa; 20])]);
    assert!(matches!(
        module.on_install(addr(1), &init),
        Err(ExecutorError::InvalidCalldata(_))
    ));
    assert!(!module.get_pkp_info(&addr(1)).installed);
}

#[test]
fn test_calldata_dispatch() {
    let module = module();
    let mut forwarder = RecordingForwarder::default();

    let init = AbiEncoder::encode_values(&[AbiValue::Address([0xaa; 20]), AbiValue::FixedBytes([0x05; 32])]);
    let output = module
        .call(addr(1), &ExecutorCall::OnInstall { data: init }.encode(), &mut forwarder)
        .unwrap();
    assert!(output.is_empty());

    let output = module
        .call(addr(9), &ExecutorCall::GetPkpInfo { account: addr(1) }.encode(), &mut forwarder)
        .unwrap();
    let types = ExecutorFunction::GetPkpInfo.abi().outputs;
    let decoded = AbiDecoder::decode(&output, &types).unwrap();
    assert_eq!(
        decoded,
        vec![
            AbiValue::Address([0xaa; 20]),
            AbiValue::FixedBytes([0x05; 32]),
            AbiValue::Bool(true)
        ]
    );

    let query = ExecutorCall::IsModuleInstalled {
        account: addr(1),
        module_type_id: U256::from(2),
    };
    let output = module.call(addr(9), &query.encode(), &mut forwarder).unwrap();
    assert_eq!(AbiDecoder::decode(&output, &[AbiType::Bool]).unwrap(), vec![AbiValue::Bool(true)]);

    let huge_type = ExecutorCall::IsModuleType {
        module_type_id: U256::MAX,
    };
    let output = module.call(addr(9), &huge_type.encode(), &mut forwarder).unwrap();
    assert_eq!(AbiDecoder::decode(&output, &[AbiType::Bool]).unwrap(), vec![AbiValue::Bool(false)]);

    // Install failures surface as the error kind
    let again = AbiEncoder::encode_values(&[AbiValue::Address([0xbb; 20]), AbiValue::FixedBytes([0; 32])]);
    let err = module
        .call(addr(1), &ExecutorCall::OnInstall { data: again }.encode(), &mut forwarder)
        .unwrap_err();
    assert_eq!(err, ExecutorError::AlreadyInstalled);
}

#[test]
fn test_dispatch_operation_hash_matches_direct() {
    let module = module();
    let call = ExecutorCall::GetOperationHash {
        account: addr(1),
        target: addr(2),
        value: U256::from(3),
        data: vec![4, 5, 6],
    };
    let output = module
        .call(addr(1), &call.encode(), &mut RecordingForwarder::default())
        .unwrap();
    let direct = module.get_operation_hash(&addr(1), &addr(2), &U256::from(3), &[4, 5, 6]);
    assert_eq!(output, direct.0.to_vec());
}

#[test]
fn test_log_records_use_module_address() {
    let (module, _) = installed();
    let records = module.log_records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].address, module.address());

    assert_eq!(module.take_logs().len(), 1);
    assert!(module.logs().is_empty());
}

#[test]
fn test_new_rejects_invalid_config() {
    let config = ExecutorConfig::new(0, MODULE.parse().unwrap());
    assert!(ExecutorModule::new(config).is_err());
}

#[test]
fn test_rejection_logs_never_show_signature() {
    let (module, _) = installed();
    let intruder = LocalSigner::from_hex(OTHER_KEY).unwrap();
    let sig = sign(&module, &intruder, addr(1), addr(2), U256::ZERO, b"");

    crate::utils::logging::start_capture();
    let _ = module.execute_from_executor(addr(1), addr(2), U256::ZERO, b"", &sig, &mut RecordingForwarder::default());
    let lines = crate::utils::logging::take_capture();

    assert!(lines.iter().any(|line| line.contains("bad signature")));
    let sig_hex = hex::encode(&sig);
    assert!(lines.iter().all(|line| !line.contains(&sig_hex[..16])));
}
