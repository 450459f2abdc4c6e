#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use pqseal_core::compression::codecs::lz4::Lz4;
    use pqseal_core::scheme::{SchemeError, SchemeFamily, SchemeName, Schemes};

    #[test]
    fn standard_inventory() {
        let schemes = Schemes::standard();
        assert_eq!(schemes.names(SchemeFamily::Compression), ["DEFLATE", "GZIP", "LZ4", "ZSTD"]);
        assert!(schemes.aead.contains("xchacha20-blake3"));
        assert!(schemes.kem.contains("ML-KEM-1024"));
        assert!(schemes.signature.contains("dilithium3"));
        for family in SchemeFamily::ALL {
            assert!(!schemes.names(family).is_empty(), "{family} is empty");
        }
    }

    #[test]
    fn unknown_name_reports_family() {
        let schemes = Schemes::standard();
        let err = schemes.lookup(SchemeFamily::Kdf, "pbkdf2").err().unwrap();
        assert_eq!(err, SchemeError::Unknown { family: SchemeFamily::Kdf, name: "PBKDF2".into() });
        assert_eq!(err.to_string(), "unknown kdf scheme: PBKDF2");
    }

    #[test]
    fn names_do_not_cross_families() {
        let schemes = Schemes::standard();
        assert!(schemes.hash.by_name("ZSTD").is_err());
        assert!(schemes.compression.by_name("SHA256").is_err());
    }

    #[test]
    #[should_panic(expected = "duplicate")]
    fn duplicate_registration_panics() {
        let mut schemes = Schemes::standard();
        schemes.compression.register(std::sync::Arc::new(Lz4));
    }

    proptest! {
        #[test]
        fn prop_lookup_is_idempotent_and_case_insensitive(
            idx in 0usize..4,
            mask in proptest::collection::vec(any::<bool>(), 8),
        ) {
            let schemes = Schemes::standard();
            let names = schemes.names(SchemeFamily::Compression);
            let name = names[idx];
            let mixed: String = name
                .chars()
                .zip(mask.iter().cycle())
                .map(|(c, lower)| if *lower { c.to_ascii_lowercase() } else { c })
                .collect();

            let a = schemes.compression.by_name(&mixed).unwrap();
            let b = schemes.compression.by_name(a.name()).unwrap();
            prop_assert_eq!(a.name(), name);
            prop_assert_eq!(&a, &b);
            prop_assert_eq!(SchemeName::new(&mixed), a.encode());
        }
    }
}
