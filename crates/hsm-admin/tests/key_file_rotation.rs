//! # Key File Rotation
//!
//! Drives a full wrapping key rotation against the simulated HSM using
//! password-protected administrator key files and a TOML configuration.
//!
//! ## Test Categories
//!
//! 1. **Rotation** - load current, load pending, finalize
//! 2. **Credentials** - wrong password, unknown administrator
//! 3. **Instance Summary** - roster names and register states
//! 4. **Destruction** - zeroize wipes keys, keeps administrators

use admin_keys::{AdminCertificate, AdminSigningKey, EncryptedKeyFile};
use hsm_admin::test_utils::{reason, InMemoryHsm, RecordingTransport, RC_REJECTED};
use hsm_admin::{
    AdminConfig, AdminError, Credential, DigestAlgorithm, DomainAdminApi, DomainAdminDependencies,
    DomainAdminService, DomainEntry, KeyFileSigner, KeyRegister, MonotonicCounterSource,
    RegisterStatus, SignatureKeyReference, SigningError, StaticDomainDirectory,
};
use tempfile::TempDir;

// =============================================================================
// TEST HELPERS
// =============================================================================

type Service = DomainAdminService<
    RecordingTransport<InMemoryHsm>,
    StaticDomainDirectory,
    KeyFileSigner,
    MonotonicCounterSource,
    DigestAlgorithm,
>;

struct Fixture {
    _dir: TempDir,
    config: AdminConfig,
    entry: DomainEntry,
    service: Service,
}

fn password(name: &str) -> String {
    format!("correct horse {}", name)
}

/// Three administrators with key files on disk, imprinted into one domain
/// with both thresholds at 2.
fn fixture() -> Fixture {
    let dir = TempDir::new().unwrap();
    let mut toml = String::from(
        "[signing]\ndigest = \"sha512\"\n\n[quorum]\nsignature_threshold = 2\nrevocation_threshold = 2\n",
    );
    let mut certificates = Vec::new();
    for name in ["alice", "bob", "carol"] {
        let key = AdminSigningKey::generate();
        let path = dir.path().join(format!("{}.json", name));
        EncryptedKeyFile::seal_with_iterations(name, &key, &password(name), 8)
            .unwrap()
            .write(&path)
            .unwrap();
        certificates.push(AdminCertificate::issue(name, &key).unwrap().to_bytes());
        toml.push_str(&format!(
            "\n[[administrators]]\nname = \"{}\"\nkey = \"{}\"\nski = \"{}\"\n",
            name,
            path.display(),
            hex::encode(key.ski())
        ));
    }
    toml.push_str(
        "\n[[domains]]\nhsm_id = \"hsm-7\"\nlocation = \"[us-south].[AZ1].[01].[07]\"\ncrypto_module_index = 1\ndomain_index = 7\n",
    );

    let config = AdminConfig::parse(&toml).unwrap();
    let entry = config.domains[0].clone();
    let hsm = InMemoryHsm::with_digest(config.signing.digest).with_domain(&entry);
    hsm.imprint(&entry, &certificates, config.domain_attributes());

    let service = DomainAdminService::new(DomainAdminDependencies {
        transport: RecordingTransport::new(hsm),
        directory: config.directory(),
        signer: KeyFileSigner::new(),
        counters: MonotonicCounterSource::new(),
        digest: config.signing.digest,
    });
    Fixture {
        _dir: dir,
        config,
        entry,
        service,
    }
}

impl Fixture {
    fn signers(&self, names: &[&str]) -> Vec<SignatureKeyReference> {
        self.config
            .signers(names, |admin| Some(Credential::Password(password(&admin.name))))
            .unwrap()
    }

    fn hsm(&self) -> &InMemoryHsm {
        self.service.transport().inner()
    }
}

// =============================================================================
// 1. ROTATION
// =============================================================================

#[test]
fn full_rotation_with_two_of_three() {
    let f = fixture();
    let quorum = f.signers(&["alice", "carol"]);

    let first = f.service.create_random_key(&f.entry, &quorum).unwrap();
    assert_eq!(first.register, KeyRegister::Current);

    let second = f.service.create_random_key(&f.entry, &quorum).unwrap();
    assert_eq!(second.register, KeyRegister::Pending);
    assert_ne!(first.verification_pattern, second.verification_pattern);

    f.service.finalize_key(&f.entry, &quorum).unwrap();

    let info = f.service.query_domain_info(&f.entry).unwrap();
    assert_eq!(info.current.status, RegisterStatus::Valid);
    assert_eq!(info.current.verification_pattern, second.verification_pattern);
    assert_eq!(info.pending.status, RegisterStatus::Empty);
}

#[test]
fn third_key_is_refused_without_signing() {
    let f = fixture();
    let quorum = f.signers(&["alice", "bob"]);
    f.service.create_random_key(&f.entry, &quorum).unwrap();
    f.service.create_random_key(&f.entry, &quorum).unwrap();
    let signed_before = f.service.transport().signed_count();

    let result = f.service.create_random_key(&f.entry, &quorum);
    assert!(matches!(result, Err(AdminError::InvalidState { .. })));
    assert_eq!(f.service.transport().signed_count(), signed_before);
}

#[test]
fn single_signature_is_below_threshold() {
    let f = fixture();
    let result = f.service.create_random_key(&f.entry, &f.signers(&["bob"]));
    match result {
        Err(AdminError::CommandRejected { status, .. }) => {
            assert_eq!(status.return_code, RC_REJECTED);
            assert_eq!(status.reason_code, reason::QUORUM);
        }
        other => panic!("expected quorum rejection, got {:?}", other),
    }
    assert_eq!(
        f.hsm().domain_info(&f.entry).unwrap().current.status,
        RegisterStatus::Empty
    );
}

// =============================================================================
// 2. CREDENTIALS
// =============================================================================

#[test]
fn wrong_password_aborts_before_submission() {
    let f = fixture();
    let mut quorum = f.signers(&["alice", "bob"]);
    quorum[1].credential = Credential::Password("guess".into());

    let result = f.service.create_random_key(&f.entry, &quorum);
    assert!(matches!(
        result,
        Err(AdminError::Signing(SigningError::InvalidCredential { .. }))
    ));
    assert_eq!(f.service.transport().signed_count(), 0);
}

#[test]
fn bearer_token_is_not_a_key_file_credential() {
    let f = fixture();
    let mut quorum = f.signers(&["alice", "bob"]);
    quorum[0].credential = Credential::BearerToken("token".into());

    assert!(matches!(
        f.service.clear_pending_key(&f.entry, &quorum),
        Err(AdminError::Signing(SigningError::InvalidCredential { .. }))
    ));
}

#[test]
fn unknown_administrator_is_a_config_error() {
    let f = fixture();
    assert!(f
        .config
        .signers(&["mallory"], |_| Some(Credential::Password("x".into())))
        .is_err());
}

// =============================================================================
// 3. INSTANCE SUMMARY
// =============================================================================

#[test]
fn instance_summary_names_every_administrator() {
    let f = fixture();
    let quorum = f.signers(&["bob", "carol"]);
    let loaded = f.service.create_random_key(&f.entry, &quorum).unwrap();

    let summary = f.service.query_instance().unwrap();
    assert_eq!(summary.len(), 1);
    let hsm = &summary[0];
    assert_eq!(hsm.hsm_id, "hsm-7");
    assert_eq!(hsm.location, "[us-south].[AZ1].[01].[07]");
    assert_eq!(hsm.signature_threshold, 2);
    assert_eq!(hsm.revocation_threshold, 2);

    let mut names: Vec<&str> = hsm.admins.iter().map(|a| a.name.as_str()).collect();
    names.sort_unstable();
    assert_eq!(names, ["alice", "bob", "carol"]);

    assert_eq!(hsm.current_key_status, "Valid");
    assert_eq!(hsm.current_key_vp, loaded.verification_pattern.to_hex());
    assert_eq!(hsm.pending_key_status, "Empty");
}

#[test]
fn revoked_administrator_can_no_longer_sign() {
    let f = fixture();
    let carol = f.signers(&["carol"]).remove(0);
    f.service
        .remove_domain_admin(&f.entry, &carol.ski.to_hex(), &f.signers(&["alice", "bob"]))
        .unwrap();
    assert_eq!(f.hsm().admins(&f.entry).len(), 2);

    let result = f.service.create_random_key(&f.entry, &f.signers(&["alice", "carol"]));
    assert!(matches!(result, Err(AdminError::CommandRejected { .. })));
}

// =============================================================================
// 4. DESTRUCTION
// =============================================================================

#[test]
fn zeroize_wipes_registers_and_keeps_roster() {
    let f = fixture();
    let quorum = f.signers(&["alice", "bob"]);
    f.service.create_random_key(&f.entry, &quorum).unwrap();
    f.service.create_random_key(&f.entry, &quorum).unwrap();

    f.service.zeroize_domain(&f.entry, &quorum).unwrap();

    let info = f.service.query_domain_info(&f.entry).unwrap();
    assert_eq!(info.current.status, RegisterStatus::Empty);
    assert_eq!(info.pending.status, RegisterStatus::Empty);
    assert_eq!(f.service.query_domain_admins(&f.entry).unwrap().len(), 3);

    // a zeroized domain accepts a fresh key
    let reloaded = f.service.create_random_key(&f.entry, &quorum).unwrap();
    assert_eq!(reloaded.register, KeyRegister::Current);
}
