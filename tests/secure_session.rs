//! A secure tunnelling session driven end to end through the public API.
//!
//! Client and gateway each hold their own X25519 key pair; both sides share
//! the configured user password and device authentication code.

use knx_secure::protocol::catalog::multicast;
use knx_secure::protocol::constants::{MediumType, ServiceType};
use knx_secure::protocol::frame::Frame;
use knx_secure::protocol::services::{ConnectionHeader, TunnellingRequest};
use knx_secure::secure::{
    ensure_crypto_ready_with_rng, CryptoContext, CryptoEngine, KeyType, SecureKey,
    SecureSessionStatus, SecureWrapper, SessionAuthenticate, SessionRequest, SessionResponse,
    SessionStatus, TimerNotify,
};
use knx_secure::{ga, ia, KnxError, LinkLayerFrame, SecureConfig};

const CONFIG: &str = "
# gateway in the test rig
KNX_GATEWAY_IP=192.168.1.20
KNX_USER_ID=2
KNX_USER_PASSWORD=secret
KNX_DEVICE_AUTH_CODE=trustme
KNX_SERIAL_NUMBER=00fa12345678
KNX_BACKBONE_KEY=000102030405060708090a0b0c0d0e0f
";

fn ctx() -> CryptoContext {
    ensure_crypto_ready_with_rng(&mut rand::thread_rng()).unwrap()
}

fn key_pair(ctx: &CryptoContext) -> (SecureKey, SecureKey) {
    let private = SecureKey::generate_private_key_with_rng(ctx, &mut rand::thread_rng()).unwrap();
    let public = SecureKey::public_key_from_private(&private).unwrap();
    (private, public)
}

fn group_write() -> LinkLayerFrame {
    LinkLayerFrame::builder()
        .medium_type(MediumType::NetIp)
        .source(ia!(1, 1, 10))
        .destination(ga!(1 / 2 / 3))
        .tpdu(multicast::group_value_write(&[0x01]).unwrap())
        .build()
        .unwrap()
}

#[test]
fn test_secure_tunnelling_session() {
    let ctx = ctx();
    let config = SecureConfig::parse(CONFIG).unwrap();
    let password_hash = config.user_password_hash(&ctx).unwrap();
    let device_hash = config.device_authentication_code_hash(&ctx).unwrap();

    let (client_private, client_public) = key_pair(&ctx);
    let (server_private, server_public) = key_pair(&ctx);

    // client -> gateway: SESSION_REQUEST
    let request = SessionRequest::new(config.control_endpoint(), &client_public)
        .unwrap()
        .to_frame()
        .unwrap()
        .bytes()
        .unwrap();
    let request = Frame::decode_expecting(&request, 0, ServiceType::SessionRequest).unwrap();
    let request = SessionRequest::from_frame(&request).unwrap();
    assert_eq!(request.control_endpoint, config.control_endpoint());
    let seen_client = request.public_key().unwrap();
    assert_eq!(seen_client, client_public);

    // gateway -> client: SESSION_RESPONSE
    let response =
        SessionResponse::new_authenticated(&ctx, &device_hash, 0x0001, &server_public, &seen_client)
            .unwrap()
            .to_frame()
            .unwrap();
    let response = SessionResponse::from_frame(&response).unwrap();
    response.verify(&ctx, &device_hash, &client_public).unwrap();
    let seen_server = response.public_key().unwrap();

    let client_key = CryptoEngine::session_key_from_keys(&ctx, &client_private, &seen_server).unwrap();
    let server_key = CryptoEngine::session_key_from_keys(&ctx, &server_private, &seen_client).unwrap();
    assert_eq!(client_key, server_key);

    // client -> gateway: SESSION_AUTHENTICATE inside a wrapper
    let authenticate = SessionAuthenticate::new_authenticated(
        &ctx,
        &password_hash,
        config.user_id,
        &client_public,
        &seen_server,
    )
    .unwrap();
    let sealed = SecureWrapper::seal(
        &ctx,
        &client_key,
        response.session_id,
        0,
        &config.serial_number,
        0,
        &authenticate.to_frame().unwrap(),
    )
    .unwrap();
    let inner = SecureWrapper::open(&ctx, &server_key, &sealed).unwrap();
    let received = SessionAuthenticate::from_frame(&inner).unwrap();
    assert_eq!(received.user_id, 2);
    received
        .verify(&ctx, &password_hash, &seen_client, &server_public)
        .unwrap();

    // gateway -> client: SESSION_STATUS inside a wrapper
    let status = SessionStatus::new(SecureSessionStatus::AuthenticationSuccess);
    let sealed = SecureWrapper::seal(
        &ctx,
        &server_key,
        response.session_id,
        0,
        &[0; 6],
        0,
        &status.to_frame().unwrap(),
    )
    .unwrap();
    let inner = SecureWrapper::open(&ctx, &client_key, &sealed).unwrap();
    assert_eq!(SessionStatus::from_frame(&inner).unwrap(), status);

    // tunnelled group write, sequence counter moved on
    let tunnelling = TunnellingRequest::new(ConnectionHeader::new(0x21, 0), group_write());
    let sealed = SecureWrapper::seal(
        &ctx,
        &client_key,
        response.session_id,
        1,
        &config.serial_number,
        0,
        &tunnelling.to_frame().unwrap(),
    )
    .unwrap();
    let wire = sealed.bytes().unwrap();
    let sealed = Frame::decode_expecting(&wire, 0, ServiceType::SecureWrapper).unwrap();
    let inner = SecureWrapper::open(&ctx, &server_key, &sealed).unwrap();
    assert_eq!(TunnellingRequest::from_frame(&inner).unwrap(), tunnelling);
}

#[test]
fn test_wrong_password_fails_authentication() {
    let ctx = ctx();
    let (_, client_public) = key_pair(&ctx);
    let (_, server_public) = key_pair(&ctx);

    let authenticate = SessionAuthenticate::new_authenticated(
        &ctx,
        &CryptoEngine::user_password_hash(&ctx, b"guess"),
        SessionAuthenticate::MANAGEMENT_USER,
        &client_public,
        &server_public,
    )
    .unwrap();
    let expected = CryptoEngine::user_password_hash(&ctx, b"secret");
    match authenticate.verify(&ctx, &expected, &client_public, &server_public) {
        Err(KnxError::Crypto(e)) => assert!(e.is_invalid_mac()),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_gateway_response_bound_to_client_key() {
    let ctx = ctx();
    let device_hash = CryptoEngine::device_authentication_code_hash(&ctx, b"trustme");
    let (_, client_public) = key_pair(&ctx);
    let (_, other_public) = key_pair(&ctx);
    let (_, server_public) = key_pair(&ctx);

    let response =
        SessionResponse::new_authenticated(&ctx, &device_hash, 7, &server_public, &client_public)
            .unwrap();
    response.verify(&ctx, &device_hash, &client_public).unwrap();
    assert!(response.verify(&ctx, &device_hash, &other_public).is_err());
}

#[test]
fn test_wrapper_with_wrong_session_key() {
    let ctx = ctx();
    let (client_private, _) = key_pair(&ctx);
    let (_, server_public) = key_pair(&ctx);
    let (_, stranger_public) = key_pair(&ctx);

    let key = CryptoEngine::session_key_from_keys(&ctx, &client_private, &server_public).unwrap();
    let other = CryptoEngine::session_key_from_keys(&ctx, &client_private, &stranger_public).unwrap();
    assert_ne!(key, other);

    let inner = TunnellingRequest::new(ConnectionHeader::new(1, 0), group_write())
        .to_frame()
        .unwrap();
    let sealed = SecureWrapper::seal(&ctx, &key, 1, 0, &[0; 6], 0, &inner).unwrap();
    match SecureWrapper::open(&ctx, &other, &sealed) {
        Err(KnxError::Crypto(e)) => assert!(e.is_invalid_mac()),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_timer_notify_with_configured_backbone_key() {
    let ctx = ctx();
    let config = SecureConfig::parse(CONFIG).unwrap();
    let backbone_key = config.backbone_key.unwrap();

    let notify =
        TimerNotify::new_authenticated(&ctx, &backbone_key, 0x0000_1234_5678, config.serial_number, 0x0102)
            .unwrap();
    let frame = notify.to_frame().unwrap();
    assert_eq!(frame.size(), 6 + TimerNotify::SIZE);

    let received = TimerNotify::from_frame(&frame).unwrap();
    assert_eq!(received.timer_value, 0x0000_1234_5678);
    received.verify(&ctx, &backbone_key).unwrap();

    let mut other_key = backbone_key;
    other_key[15] ^= 0x01;
    assert!(received.verify(&ctx, &other_key).is_err());
}

#[test]
fn test_public_key_from_der_export() {
    let ctx = ctx();
    let (_, public) = key_pair(&ctx);

    let mut der = hex::decode("302a300506032b656e032100").unwrap();
    der.extend_from_slice(&public.bytes());
    let imported = SecureKey::from_bytes(KeyType::Public, &der, 0).unwrap();
    assert_eq!(imported, public);

    match SecureKey::from_bytes(KeyType::Public, &der[..20], 0) {
        Err(KnxError::Crypto(e)) => assert!(e.is_invalid_key()),
        other => panic!("unexpected {other:?}"),
    }
}
