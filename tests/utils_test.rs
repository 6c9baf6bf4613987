use tidlcli::utils::*;
use tidlcli::types::PkceMaterial;

#[test]
fn test_generate_state_length_and_charset() {
    for length in [1, 7, 16, 33] {
        let state = generate_state(length).unwrap();
        assert_eq!(state.len(), length);
        assert!(state.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    // Two generated states should be different
    let a = generate_state(DEFAULT_STATE_LENGTH).unwrap();
    let b = generate_state(DEFAULT_STATE_LENGTH).unwrap();
    assert_ne!(a, b);
}

#[test]
fn test_generate_state_rejects_zero() {
    assert!(matches!(
        generate_state(0),
        Err(tidlcli::ApiError::InvalidArgument(_))
    ));
}

#[test]
fn test_generate_code_verifier_bounds() {
    assert_eq!(generate_code_verifier(43).unwrap().len(), 43);
    assert_eq!(generate_code_verifier(128).unwrap().len(), 128);

    assert!(generate_code_verifier(42).is_err());
    assert!(generate_code_verifier(129).is_err());
}

#[test]
fn test_generate_code_challenge() {
    let verifier = "test_verifier_123";
    let challenge = generate_code_challenge(verifier, HashAlgorithm::Sha256);

    // Deterministic, URL-safe and unpadded
    assert_eq!(challenge, generate_code_challenge(verifier, HashAlgorithm::Sha256));
    assert!(
        challenge
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    );
    assert!(!challenge.contains('='));

    // 32 byte digest encodes to 43 characters
    assert_eq!(challenge.len(), 43);
    assert_eq!(generate_code_challenge(verifier, HashAlgorithm::Sha384).len(), 64);
    assert_eq!(generate_code_challenge(verifier, HashAlgorithm::Sha512).len(), 86);

    assert_ne!(
        challenge,
        generate_code_challenge("different_verifier", HashAlgorithm::Sha256)
    );
}

#[test]
fn test_generate_code_challenge_rfc7636_vector() {
    let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
    assert_eq!(
        generate_code_challenge(verifier, HashAlgorithm::Sha256),
        "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
    );
}

#[test]
fn test_pkce_material() {
    let pkce = PkceMaterial::generate().unwrap();
    assert_eq!(pkce.code_verifier.len(), DEFAULT_VERIFIER_LENGTH);
    assert_eq!(pkce.state.len(), DEFAULT_STATE_LENGTH);
    assert_eq!(
        pkce.code_challenge,
        generate_code_challenge(&pkce.code_verifier, HashAlgorithm::Sha256)
    );
}

#[test]
fn test_basic_auth() {
    assert_eq!(basic_auth("Aladdin", "open sesame"), "Basic QWxhZGRpbjpvcGVuIHNlc2FtZQ==");
}

#[test]
fn test_form_encode() {
    let encoded = form_encode(&[("a", "1 2"), ("filter[id]", "x,y")]);
    assert_eq!(encoded, "a=1+2&filter%5Bid%5D=x%2Cy");
    assert_eq!(form_encode::<&str, &str>(&[]), "");
}

#[test]
fn test_split_scope() {
    assert_eq!(split_scope(" user.read  collection.read "), vec!["user.read", "collection.read"]);
    assert!(split_scope("").is_empty());
}

#[test]
fn test_encode_path_segment() {
    assert_eq!(encode_path_segment("251380836"), "251380836");
    assert_eq!(encode_path_segment("daft punk"), "daft%20punk");
    assert_eq!(encode_path_segment("a/b?c"), "a%2Fb%3Fc");
    assert_eq!(encode_path_segment("A-z_0.9~"), "A-z_0.9~");
    assert_eq!(encode_path_segment("é"), "%C3%A9");
}

#[test]
fn test_random_hex_odd_length() {
    let value = random_hex(7).unwrap();
    assert_eq!(value.len(), 7);
    assert!(value.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f')));
    assert_eq!(random_hex(0).unwrap(), "");
}
