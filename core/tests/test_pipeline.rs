// # 📂 `tests/test_pipeline.rs`

// * ✅ passphrase round trip and wrong passphrase
// * ✅ signed + compressed large payload
// * ✅ empty payload through every stage
// * ✅ header survives the record unchanged
// * ✅ chunking under a small chunk size
// * ✅ validity window overflow
// * ✅ property: round trip over payloads and compression choices

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use proptest::prelude::*;

    use pqseal_core::config::MessageConfig;
    use pqseal_core::crypto::{KdfCost, PrivateKey};
    use pqseal_core::encryption::{DerivedEncrypter, PassphraseEncrypter};
    use pqseal_core::message::{DecryptOptions, FileInfo, IncomingMessage, MessageBuilder, Verification};
    use pqseal_core::scheme::Schemes;
    use pqseal_core::telemetry::Stage;

    // ------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------
    fn fast_kdf() -> MessageConfig {
        MessageConfig {
            kdf: "SCRYPT".into(),
            kdf_cost: Some(KdfCost::Scrypt { log_n: 4, r: 8, p: 1 }),
            ..MessageConfig::default()
        }
    }

    fn signing_key(schemes: &Schemes) -> PrivateKey {
        PrivateKey::generate_signing(&schemes.signature.by_name("ED25519").unwrap())
    }

    #[test]
    fn passphrase_round_trip() -> anyhow::Result<()> {
        let schemes = Schemes::standard();
        let enc = PassphraseEncrypter::with_config(&schemes, &fast_kdf(), "correct horse")?;
        let (record, encoded) = MessageBuilder::new(&schemes).encrypt(enc).build(&b"hello"[..])?.encode_to_vec()?;
        assert!(encoded.header.is_encrypted());
        assert!(encoded.auth.tag.is_some());

        let incoming = IncomingMessage::decode(&record[..], &schemes)?;
        assert_eq!(incoming.header(), &encoded.header);
        let options = DecryptOptions::new().passphrase("correct horse".to_string());
        let (plain, opened) = incoming.decrypt_to_vec(options)?;
        assert_eq!(plain, b"hello");
        assert_eq!(opened.verification, Verification::Unsigned);
        assert_eq!(opened.auth, encoded.auth);
        Ok(())
    }

    #[test]
    fn wrong_passphrase_is_a_tag_mismatch() {
        let schemes = Schemes::standard();
        let enc = PassphraseEncrypter::with_config(&schemes, &fast_kdf(), "correct horse").unwrap();
        let (record, _) = MessageBuilder::new(&schemes).encrypt(enc).build(&b"hello"[..]).unwrap().encode_to_vec().unwrap();

        let incoming = IncomingMessage::decode(&record[..], &schemes).unwrap();
        let err = incoming.decrypt_to_vec(DecryptOptions::new().passphrase("wrong".to_string())).unwrap_err();
        assert!(err.is_tag_mismatch(), "unexpected error: {err}");
    }

    #[test]
    fn large_signed_compressed_message_shrinks() -> anyhow::Result<()> {
        let schemes = Schemes::standard();
        let key = signing_key(&schemes);
        let issuer = key.public_key().clone();
        let payload: Vec<u8> = b"lorem ipsum dolor sit amet ".iter().copied().cycle().take(1 << 20).collect();

        let (record, encoded) = MessageBuilder::new(&schemes)
            .sign(key)
            .expires_in(Duration::from_secs(3600))
            .compress("zstd", Some(3))
            .build(&payload[..])?
            .encode_to_vec()?;
        assert!(record.len() < payload.len() / 10);
        assert_eq!(encoded.telemetry.bytes_plaintext, payload.len() as u64);
        assert!(encoded.telemetry.compression_ratio < 0.1);
        assert!(encoded.telemetry.has_all_stages(&[Stage::Sign, Stage::Compress, Stage::Encode]));

        let incoming = IncomingMessage::decode(&record[..], &schemes)?;
        let (plain, opened) = incoming.decrypt_to_vec(DecryptOptions::new().issuer(issuer.clone()))?;
        assert_eq!(plain, payload);
        match opened.verification {
            Verification::Verified { issuer: fp, created, expires } => {
                assert_eq!(fp, issuer.fingerprint());
                assert_eq!(Some(created + 3600), expires);
            }
            other => panic!("expected verified, got {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn empty_payload_round_trips_through_every_stage() -> anyhow::Result<()> {
        let schemes = Schemes::standard();
        let key = signing_key(&schemes);
        let issuer = key.public_key().clone();
        let secret = [9u8; 32];
        let (record, encoded) = MessageBuilder::new(&schemes)
            .sign(key)
            .compress("gzip", None)
            .encrypt(DerivedEncrypter::new(&schemes, &secret)?)
            .build(&b""[..])?
            .encode_to_vec()?;
        assert_eq!(encoded.telemetry.bytes_plaintext, 0);

        let options = DecryptOptions::new().derived_key(&secret).issuer(issuer);
        let (plain, opened) = IncomingMessage::decode(&record[..], &schemes)?.decrypt_to_vec(options)?;
        assert!(plain.is_empty());
        assert!(opened.verification.is_verified());
        Ok(())
    }

    #[test]
    fn file_info_and_time_travel_in_the_header() -> anyhow::Result<()> {
        let schemes = Schemes::standard();
        let file = FileInfo::new("report.pdf").with_times(1_700_000_000, 1_700_000_100);
        let (record, _) = MessageBuilder::new(&schemes)
            .file(file.clone())
            .time(1_700_000_200)
            .build(&b"%PDF"[..])?
            .encode_to_vec()?;

        let incoming = IncomingMessage::decode(&record[..], &schemes)?;
        assert_eq!(incoming.header().file, file);
        assert_eq!(incoming.header().time, 1_700_000_200);
        assert!(!incoming.header().is_signed());
        let (plain, _) = incoming.decrypt_to_vec(DecryptOptions::new())?;
        assert_eq!(plain, b"%PDF");
        Ok(())
    }

    #[test]
    fn small_chunks_split_the_body() -> anyhow::Result<()> {
        let schemes = Schemes::standard();
        let payload = vec![0x5au8; 5_000];
        let (record, encoded) = MessageBuilder::new(&schemes)
            .chunk_size(512)
            .encrypt(DerivedEncrypter::new(&schemes, &[1u8; 32])?)
            .build(&payload[..])?
            .encode_to_vec()?;
        assert_eq!(encoded.telemetry.chunks, 10);
        assert_eq!(encoded.telemetry.output_bytes(), record.len() as u64);

        let options = DecryptOptions::new().derived_key(&[1u8; 32]);
        let (plain, opened) = IncomingMessage::decode(&record[..], &schemes)?.decrypt_to_vec(options)?;
        assert_eq!(plain, payload);
        assert_eq!(opened.telemetry.chunks, 10);
        assert_eq!(opened.telemetry.bytes_plaintext, 5_000);
        Ok(())
    }

    #[test]
    fn chunk_size_out_of_range_is_rejected_at_build() {
        let schemes = Schemes::standard();
        let err = MessageBuilder::new(&schemes).chunk_size(16).build(&b"x"[..]).err().unwrap();
        assert_eq!(err.class(), pqseal_core::types::ErrorClass::Configuration);
    }

    #[test]
    fn validity_overflowing_the_timestamp_is_rejected_at_build() {
        let schemes = Schemes::standard();
        let err = MessageBuilder::new(&schemes)
            .sign(signing_key(&schemes))
            .time(1_000)
            .expires_in(Duration::MAX)
            .build(&b"x"[..])
            .err()
            .unwrap();
        assert_eq!(err.class(), pqseal_core::types::ErrorClass::Configuration);

        let err = MessageBuilder::new(&schemes)
            .sign(signing_key(&schemes))
            .time(i64::MAX - 10)
            .expires_in(Duration::from_secs(11))
            .build(&b"x"[..])
            .err()
            .unwrap();
        assert_eq!(err.class(), pqseal_core::types::ErrorClass::Configuration);
    }

    fn compression_choice() -> impl Strategy<Value = Option<(&'static str, Option<i32>)>> {
        prop_oneof![
            Just(None),
            Just(Some(("ZSTD", None))),
            Just(Some(("ZSTD", Some(19)))),
            Just(Some(("LZ4", None))),
            Just(Some(("DEFLATE", Some(1)))),
            Just(Some(("GZIP", Some(9)))),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn round_trip_over_payloads_and_codecs(
            payload in proptest::collection::vec(any::<u8>(), 0..6_000),
            compression in compression_choice(),
            chunk_size in 512usize..2_048,
        ) {
            let schemes = Schemes::standard();
            let key = [3u8; 32];
            let mut builder = MessageBuilder::new(&schemes)
                .chunk_size(chunk_size)
                .encrypt(DerivedEncrypter::new(&schemes, &key).unwrap());
            if let Some((name, level)) = compression {
                builder = builder.compress(name, level);
            }
            let (record, _) = builder.build(&payload[..]).unwrap().encode_to_vec().unwrap();

            let incoming = IncomingMessage::decode(&record[..], &schemes).unwrap();
            prop_assert_eq!(incoming.header().is_compressed(), compression.is_some());
            let (plain, _) = incoming.decrypt_to_vec(DecryptOptions::new().derived_key(&key)).unwrap();
            prop_assert_eq!(plain, payload);
        }
    }
}
