/// Integration-level tests for the `shared` crate.
///
/// Each section tests one module; unit tests that are tightly coupled to
/// private helpers live inside the modules themselves (see `#[cfg(test)]`
/// blocks in `detail.rs` and `login.rs`).
// ---------------------------------------------------------------------------
// JWT claims
// ---------------------------------------------------------------------------
#[cfg(test)]
mod jwt_tests {
    use shared::types::*;

    fn sample_claims() -> JwtClaims {
        JwtClaims {
            sub: "S101".to_string(),
            account_id: 42,
            account_type: AccountType::Student,
            exp: 9_999_999_999,
            iat: 1_700_000_000,
        }
    }

    #[test]
    fn claims_serialize_and_deserialize_roundtrip() {
        let c = sample_claims();
        let json = serde_json::to_string(&c).unwrap();
        let back: JwtClaims = serde_json::from_str(&json).unwrap();
        assert_eq!(back.sub, c.sub);
        assert_eq!(back.account_id, c.account_id);
        assert_eq!(back.account_type, c.account_type);
        assert_eq!(back.exp, c.exp);
        assert_eq!(back.iat, c.iat);
    }

    #[test]
    fn claims_json_contains_expected_keys() {
        let json = serde_json::to_value(&sample_claims()).unwrap();
        for key in &["sub", "account_id", "account_type", "exp", "iat"] {
            assert!(json.get(key).is_some(), "missing key: {}", key);
        }
    }

    #[test]
    fn account_type_serializes_snake_case() {
        let json = serde_json::to_value(AccountType::Admin).unwrap();
        assert_eq!(json, "admin");
    }

    #[test]
    fn account_type_from_str_rejects_unknown() {
        assert!(AccountType::from_str("student").is_some());
        assert!(AccountType::from_str("admin").is_some());
        assert!(AccountType::from_str("wizard").is_none());
    }
}

// ---------------------------------------------------------------------------
// Login types
// ---------------------------------------------------------------------------

#[cfg(test)]
mod login_tests {
    use shared::types::*;

    #[test]
    fn login_data_deserializes_reg_id() {
        let json = r#"{"reg_id":"S101","password":"pass12345"}"#;
        let d: LoginData = serde_json::from_str(json).unwrap();
        assert_eq!(d.reg_id, "S101");
    }

    #[test]
    fn admin_login_data_deserializes_username() {
        let json = r#"{"username":"tpo","password":"pass12345"}"#;
        let d: AdminLoginData = serde_json::from_str(json).unwrap();
        assert_eq!(d.username, "tpo");
    }

    #[test]
    fn all_error_variants_have_non_empty_messages() {
        let variants: Vec<Box<dyn Fn() -> LoginError>> = vec![
            Box::new(|| LoginError::InvalidCredentials),
            Box::new(|| LoginError::NotFound),
            Box::new(|| LoginError::MissingField("test".into())),
            Box::new(|| LoginError::DatabaseError),
            Box::new(|| LoginError::InternalError),
        ];
        for v in variants {
            let e = v();
            assert!(!e.to_code().is_empty());
            assert!(!e.to_message().is_empty());
        }
    }

    #[test]
    fn login_error_response_is_serializable() {
        let r = LoginError::NotFound.to_response();
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["code"], "NOT_FOUND");
    }

    #[test]
    fn login_response_success_serializes_all_fields() {
        let r = LoginResponse::Success {
            account_id: 1,
            reg_id: "S101".into(),
            email: Some("a@x.com".into()),
            expires_in: 86400,
            message: "ok".into(),
        };
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["expires_in"], 86400);
    }

    #[test]
    fn login_success_never_carries_password_material() {
        let r = LoginResponse::Success {
            account_id: 1,
            reg_id: "S101".into(),
            email: None,
            expires_in: 0,
            message: "ok".into(),
        };
        let json = serde_json::to_string(&r).unwrap();
        assert!(!json.contains("password"));
        assert!(!json.contains("hash"));
    }
}

// ---------------------------------------------------------------------------
// Signup types
// ---------------------------------------------------------------------------

#[cfg(test)]
mod register_tests {
    use shared::types::*;

    #[test]
    fn all_signup_error_codes_are_non_empty() {
        let errors: Vec<Box<dyn Fn() -> SignupError>> = vec![
            Box::new(|| SignupError::RegIdTaken),
            Box::new(|| SignupError::EmailTaken),
            Box::new(|| SignupError::UsernameTaken),
            Box::new(|| SignupError::WeakPassword),
            Box::new(|| SignupError::MissingField("f".into())),
            Box::new(|| SignupError::DatabaseError),
            Box::new(|| SignupError::InternalError),
        ];
        for e in errors {
            let err = e();
            assert!(!err.to_code().is_empty());
            assert!(!err.to_message().is_empty());
        }
    }

    #[test]
    fn signup_error_codes_unique() {
        let codes = [
            SignupError::RegIdTaken.to_code(),
            SignupError::EmailTaken.to_code(),
            SignupError::UsernameTaken.to_code(),
            SignupError::WeakPassword.to_code(),
            SignupError::MissingField("x".into()).to_code(),
            SignupError::DatabaseError.to_code(),
            SignupError::InternalError.to_code(),
        ];
        let unique: std::collections::HashSet<_> = codes.iter().collect();
        assert_eq!(codes.len(), unique.len(), "duplicate signup error codes");
    }

    #[test]
    fn signup_response_success_serializes() {
        let r = SignupResponse::Success {
            account_id: 1,
            login_key: "S101".into(),
            message: "created".into(),
        };
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["login_key"], "S101");
    }

    #[test]
    fn admin_signup_data_deserializes() {
        let json = r#"{"username":"tpo","password":"Pass1234"}"#;
        let d: AdminSignupData = serde_json::from_str(json).unwrap();
        assert_eq!(d.username, "tpo");
    }
}

// ---------------------------------------------------------------------------
// Detail types
// ---------------------------------------------------------------------------

#[cfg(test)]
mod detail_tests {
    use shared::types::*;

    #[test]
    fn detail_error_codes_are_unique() {
        let codes = [
            DetailError::OwnerNotFound.to_code(),
            DetailError::DetailNotFound.to_code(),
            DetailError::InvalidPassword.to_code(),
            DetailError::MissingField("x".into()).to_code(),
            DetailError::StorageFailure.to_code(),
            DetailError::DatabaseError.to_code(),
            DetailError::InternalError.to_code(),
        ];
        let unique: std::collections::HashSet<_> = codes.iter().collect();
        assert_eq!(codes.len(), unique.len());
    }

    #[test]
    fn storage_failure_is_distinct_from_validation() {
        assert_ne!(
            DetailError::StorageFailure.to_code(),
            DetailError::MissingField("x".into()).to_code()
        );
    }

    #[test]
    fn detail_record_defaults_to_all_absent() {
        let rec = DetailRecord {
            account_id: 9,
            ..Default::default()
        };
        assert!(rec.fullname.is_none());
        assert!(rec.phone.is_none());
        assert!(rec.profilepic.is_none());
    }

    #[test]
    fn detail_response_success_has_record() {
        let r = DetailResponse::Success {
            detail: DetailRecord {
                account_id: 1,
                fullname: Some("A".into()),
                ..Default::default()
            },
            message: "ok".into(),
        };
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["detail"]["fullname"], "A");
    }

    #[test]
    fn same_patch_twice_equals_once() {
        let patch: DetailPatch =
            serde_json::from_str(r#"{"fullname":"A","phone":9998887776}"#).unwrap();
        let mut once = DetailRecord {
            account_id: 1,
            ..Default::default()
        };
        let mut twice = once.clone();
        patch.apply(&mut once);
        patch.apply(&mut twice);
        patch.apply(&mut twice);
        assert_eq!(once, twice);
    }
}

// ---------------------------------------------------------------------------
// Job types
// ---------------------------------------------------------------------------

#[cfg(test)]
mod job_tests {
    use shared::types::*;

    #[test]
    fn job_view_serializes_applicants() {
        let j = JobView {
            id: 1,
            job_uid: "abc123".into(),
            company: "Acme".into(),
            logo: None,
            role: "SDE".into(),
            salary: Some("12 LPA".into()),
            location: None,
            description: None,
            applicants: vec![3, 4],
        };
        let json = serde_json::to_value(&j).unwrap();
        assert_eq!(json["applicants"][1], 4);
    }

    #[test]
    fn job_error_display_shows_code() {
        let out = format!("{}", JobError::AlreadyApplied);
        assert!(out.contains("ALREADY_APPLIED"));
    }
}

// ---------------------------------------------------------------------------
// JSON error type
// ---------------------------------------------------------------------------

#[cfg(test)]
mod json_error_tests {
    use shared::types::*;

    #[test]
    fn error_response_new_sets_status_to_error() {
        let e = ErrorResponse::new("NOT_FOUND", "resource missing");
        assert_eq!(e.status, "error");
        assert_eq!(e.code, "NOT_FOUND");
        assert_eq!(e.message, "resource missing");
    }

    #[test]
    fn error_response_serializes_correctly() {
        let e = ErrorResponse::new("FORBIDDEN", "access denied");
        let json = serde_json::to_value(&e).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["code"], "FORBIDDEN");
    }
}

// ---------------------------------------------------------------------------
// Config types
// ---------------------------------------------------------------------------

#[cfg(test)]
mod config_tests {
    use shared::types::*;

    fn minimal_toml() -> &'static str {
        r#"
            [server]
            bind = "127.0.0.1"
            port = 3000
            allowed_origins = ["http://localhost:5173"]

            [auth]
            jwt_secret = "0123456789abcdef0123456789abcdef"
        "#
    }

    #[test]
    fn config_parses_with_defaults() {
        let cfg: AppConfig = toml::from_str(minimal_toml()).unwrap();
        assert_eq!(cfg.server.addr(), "127.0.0.1:3000");
        // 24h default lifetime
        assert_eq!(cfg.auth.token_expiry_minutes, 1440);
        assert_eq!(cfg.database.path, "portal.db");
        assert_eq!(cfg.storage.upload_dir, "uploads");
    }

    #[test]
    fn origin_allowlist_is_exact_match() {
        let cfg: AppConfig = toml::from_str(minimal_toml()).unwrap();
        assert!(cfg.server.origin_allowed("http://localhost:5173"));
        assert!(!cfg.server.origin_allowed("http://localhost:5174"));
        assert!(!cfg.server.origin_allowed("localhost:5173"));
    }

    #[test]
    fn token_expiry_secs_converts_minutes() {
        let cfg: AppConfig = toml::from_str(minimal_toml()).unwrap();
        assert_eq!(cfg.auth.token_expiry_secs(), 86400);
    }
}
