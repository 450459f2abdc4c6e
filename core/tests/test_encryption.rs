// # 📂 `tests/test_encryption.rs`

// * ✅ secret (KEM) encryption, right and wrong recipient
// * ✅ group encryption: every recipient opens, outsiders do not
// * ✅ recipient lookup through a keyring
// * ✅ derived key length and key kind checks

#[cfg(test)]
mod tests {
    use pqseal_core::config::MessageConfig;
    use pqseal_core::crypto::{Keyring, PrivateKey};
    use pqseal_core::encryption::{DerivedEncrypter, EncryptionMethod, GroupEncrypter, SecretEncrypter};
    use pqseal_core::message::{DecryptOptions, IncomingMessage, MessageBuilder};
    use pqseal_core::scheme::Schemes;
    use pqseal_core::types::MessageError;

    // ------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------
    fn kem_key(schemes: &Schemes, name: &str) -> PrivateKey {
        PrivateKey::generate_kem(&schemes.kem.by_name(name).unwrap())
    }

    fn pke_key(schemes: &Schemes, name: &str) -> PrivateKey {
        PrivateKey::generate_pke(&schemes.pke.by_name(name).unwrap())
    }

    fn open(schemes: &Schemes, record: &[u8], options: DecryptOptions<'_>) -> Result<Vec<u8>, MessageError> {
        IncomingMessage::decode(record, schemes)?.decrypt_to_vec(options).map(|(plain, _)| plain)
    }

    #[test]
    fn secret_encryption_opens_for_its_recipient_only() {
        let schemes = Schemes::standard();
        for kem in ["ML-KEM-768", "ML-KEM-1024"] {
            let alice = kem_key(&schemes, kem);
            let mallory = kem_key(&schemes, kem);
            let (record, encoded) = MessageBuilder::new(&schemes)
                .encrypt(SecretEncrypter::new(&schemes, alice.public_key()).unwrap())
                .build(&b"for alice"[..])
                .unwrap()
                .encode_to_vec()
                .unwrap();
            match &encoded.header.encryption.as_ref().unwrap().method {
                EncryptionMethod::Secret { recipient, kem: name, .. } => {
                    assert_eq!(*recipient, alice.fingerprint());
                    assert_eq!(name.as_str(), kem);
                }
                other => panic!("unexpected method {other:?}"),
            }

            let plain = open(&schemes, &record, DecryptOptions::new().recipient(alice.clone())).unwrap();
            assert_eq!(plain, b"for alice");

            let err = open(&schemes, &record, DecryptOptions::new().recipient(mallory)).unwrap_err();
            assert!(err.is_tag_mismatch(), "{kem}: {err}");
        }
    }

    #[test]
    fn secret_recipient_is_found_in_keyring() {
        let schemes = Schemes::standard();
        let alice = kem_key(&schemes, "ML-KEM-768");
        let (record, _) = MessageBuilder::new(&schemes)
            .encrypt(SecretEncrypter::new(&schemes, alice.public_key()).unwrap())
            .build(&b"x"[..])
            .unwrap()
            .encode_to_vec()
            .unwrap();

        let mut keyring = Keyring::new();
        keyring.add_private(kem_key(&schemes, "ML-KEM-768"));
        keyring.add_private(alice);
        assert_eq!(open(&schemes, &record, DecryptOptions::new().keys(&keyring)).unwrap(), b"x");
    }

    #[test]
    fn group_members_open_outsiders_do_not() {
        let schemes = Schemes::standard();
        let members: Vec<PrivateKey> = vec![
            pke_key(&schemes, "ML-KEM-768-AES256GCM"),
            pke_key(&schemes, "ML-KEM-1024-XCHACHA20POLY1305"),
            pke_key(&schemes, "ML-KEM-768-AES256GCM"),
        ];
        let mut publics: Vec<_> = members.iter().map(|k| k.public_key().clone()).collect();
        publics.push(members[0].public_key().clone());

        let enc = GroupEncrypter::new(&schemes, &publics).unwrap();
        assert_eq!(enc.recipients().count(), 3);
        let (record, encoded) =
            MessageBuilder::new(&schemes).encrypt(enc).build(&b"team memo"[..]).unwrap().encode_to_vec().unwrap();
        assert_eq!(encoded.header.encryption.as_ref().unwrap().bound_recipients().len(), 3);

        for member in &members {
            let plain = open(&schemes, &record, DecryptOptions::new().recipient(member.clone())).unwrap();
            assert_eq!(plain, b"team memo");
        }

        let outsider = pke_key(&schemes, "ML-KEM-768-AES256GCM");
        let err = open(&schemes, &record, DecryptOptions::new().recipient(outsider)).unwrap_err();
        assert!(err.is_tag_mismatch(), "{err}");
    }

    #[test]
    fn group_member_is_found_in_keyring() {
        let schemes = Schemes::standard();
        let a = pke_key(&schemes, "ML-KEM-768-AES256GCM");
        let b = pke_key(&schemes, "ML-KEM-768-AES256GCM");
        let enc = GroupEncrypter::new(&schemes, &[a.public_key().clone(), b.public_key().clone()]).unwrap();
        let (record, _) = MessageBuilder::new(&schemes).encrypt(enc).build(&b"y"[..]).unwrap().encode_to_vec().unwrap();

        let mut keyring = Keyring::new();
        keyring.add_private(b);
        assert_eq!(open(&schemes, &record, DecryptOptions::new().keys(&keyring)).unwrap(), b"y");
    }

    #[test]
    fn group_needs_pke_recipients() {
        let schemes = Schemes::standard();
        assert!(matches!(GroupEncrypter::new(&schemes, &[]), Err(MessageError::Config(_))));
        let kem = kem_key(&schemes, "ML-KEM-768");
        assert!(matches!(
            GroupEncrypter::new(&schemes, &[kem.public_key().clone()]),
            Err(MessageError::WrongKeyType { .. })
        ));
    }

    #[test]
    fn secret_encrypter_rejects_signing_keys() {
        let schemes = Schemes::standard();
        let signing = PrivateKey::generate_signing(&schemes.signature.by_name("ED25519").unwrap());
        assert!(matches!(
            SecretEncrypter::new(&schemes, signing.public_key()),
            Err(MessageError::WrongKeyType { .. })
        ));
    }

    #[test]
    fn derived_key_must_match_cipher_key_size() {
        let schemes = Schemes::standard();
        assert!(DerivedEncrypter::new(&schemes, &[0u8; 16]).is_err());

        let config = MessageConfig { cipher: "AES256CTR-HMAC-SHA256".into(), ..MessageConfig::default() };
        let key = [0x42u8; 32];
        let enc = DerivedEncrypter::with_config(&schemes, &config, &key).unwrap();
        let (record, encoded) =
            MessageBuilder::new(&schemes).encrypt(enc).build(&b"ctr"[..]).unwrap().encode_to_vec().unwrap();
        assert_eq!(encoded.header.encryption.as_ref().unwrap().cipher.as_str(), "AES256CTR-HMAC-SHA256");
        assert_eq!(open(&schemes, &record, DecryptOptions::new().derived_key(&key)).unwrap(), b"ctr");

        let err = open(&schemes, &record, DecryptOptions::new().derived_key(&[0x43u8; 32])).unwrap_err();
        assert!(err.is_tag_mismatch());
    }
}
