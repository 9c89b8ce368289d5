// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn secret_debug_is_redacted() {
    let secret = Secret::new("swordfish");
    assert_eq!(format!("{secret:?}"), "Secret(***)");
    assert_eq!(secret.expose(), "swordfish");
}

#[test]
fn username_by_kind() {
    let userpass = Credential {
        id: CredentialId::new("c1"),
        name: "up".to_string(),
        owner: crate::acl::UserId::new("u1"),
        kind: CredentialKind::UsernamePassword {
            username: "root".to_string(),
            password: Secret::new("pw"),
        },
    };
    assert_eq!(userpass.username(), Some("root"));

    let community = Credential {
        id: CredentialId::new("c2"),
        name: "snmp".to_string(),
        owner: crate::acl::UserId::new("u1"),
        kind: CredentialKind::SnmpV1 {
            community: Secret::new("public"),
        },
    };
    assert_eq!(community.username(), None);
}

#[test]
fn kind_serde_tags() {
    let kind = CredentialKind::Krb5 {
        username: "svc".to_string(),
        password: Secret::new("pw"),
        realm: "EXAMPLE.ORG".to_string(),
        kdc: "kdc.example.org".to_string(),
    };
    let json = serde_json::to_value(&kind).unwrap();
    assert_eq!(json["type"], "krb5");
    assert_eq!(json["realm"], "EXAMPLE.ORG");
}

#[test]
fn protocol_names() {
    assert_eq!(CredentialProtocol::Ssh.name(), "ssh");
    assert_eq!(CredentialProtocol::Krb5.name(), "krb5");
}
