#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use graphsig::{Document, PrivateKey, PublicKeyDocument, StaticKeyResolver};
use serde_json::json;

pub const KEY_PEM: &str = include_str!("../fixtures/key.pem");
pub const KEY_PKCS1_PEM: &str = include_str!("../fixtures/key-pkcs1.pem");
pub const PUBLIC_KEY_PEM: &str = include_str!("../fixtures/pub.pem");

pub const CREATOR: &str = "https://example.com/i/bob/keys/1";
pub const OWNER: &str = "https://example.com/i/bob";

/// `created` of the known-answer signatures.
pub const CREATED: &str = "2024-01-02T03:04:05Z";

/// Signature of the reference document by the fixture key at [`CREATED`].
pub const REFERENCE_SIGNATURE: &str = "OT9fLqGrJkJofYRCvkPTG6aYopusrgVxtK08QK9JSRFLoKK4UJqLjvGhyEcayO8v3Xq26UV7mcxYEkKIRFsqFq0rEUYEGHp6tIEh8TdSNFDJabMYtNBJQ0gcKfXz+JeJ5Ec05iX+z6HtbWQUqJlbMUcahQrHtoGan7fC1ytUaq8zmwyg0SYss86ogu+cpkNV/w7hWJurzKDjsS6fHZ1VmSt5sg+KMq3vtJclPAclI60WSbThOo85Rw0DZc6EN+2V/KHuvsEf4kvRnCkEwYFlyZ4poKrUFMMkUEEhnVPmOntz4r+q1UpN0XEZNGYRcxvSxDAc2KhRKiEZP/SDizT1zg==";

/// Same, with nonce `abc`.
pub const REFERENCE_SIGNATURE_NONCE: &str = "DCmJKQpyJHxsiCnY7/ho8AaXQtJxFZvwZGZSwU8T/D2D8N22O1Yav5I8OKMyzeOFYisjE6eIhRtvoc4ZvoG2G0zO5tvWrrWwR1OUntPlnhKDs9cveU3kB/6Vo0tu16mtaCKXDoo/qmbr71bxELHPUdeSDSZitgCg09d2u6aDnc6OqVAX+RGuUjoqa8YQupDH/joal7/j4RADVgxzdhINTcE6XRC4HLlHenV6sPAH7YropTxUc2UyKibyX5EABwD1h02sPvOvntNlRHUKooHavXsmjEPhdQ0XJ1UOwIt03PBSl+Bk0L+RKlCmPvJKZSnHqik88spNr97O+8hvcBvH5g==";

pub fn created() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap()
}

pub fn private_key() -> PrivateKey {
    PrivateKey::from_pem(KEY_PEM).unwrap()
}

pub fn key_document() -> PublicKeyDocument {
    let mut key = PublicKeyDocument::new(CREATOR, PUBLIC_KEY_PEM);
    key.owner = Some(OWNER.to_string());
    key
}

pub fn resolver() -> StaticKeyResolver {
    vec![key_document()].into_iter().collect()
}

/// Canonical form: `<http://example.com/id/1> <http://example.com/foo> "bar" .\n`
pub fn reference_document() -> Document {
    Document::try_from(json!({
        "@context": [
            "https://w3id.org/payswarm/v1",
            {"ex": "http://example.com/", "id": "http://example.com/id/"}
        ],
        "@id": "id:1",
        "ex:foo": "bar"
    }))
    .unwrap()
}

pub fn listing() -> Document {
    Document::try_from(json!({
        "@context": "https://w3id.org/payswarm/v1",
        "id": "https://example.com/listings/1",
        "type": ["Listing", "gr:Offering"],
        "asset": {
            "id": "https://example.com/assets/1",
            "type": "Asset",
            "title": "Song",
            "assetContent": "https://example.com/song.ogg",
            "payee": [{
                "type": "Payee",
                "payeeRate": "0.05",
                "payeeRateType": "FlatAmount",
                "destination": "https://example.com/i/bob/accounts/primary"
            }]
        },
        "validFrom": "2024-01-01T00:00:00Z",
        "validUntil": "2024-02-01T00:00:00Z"
    }))
    .unwrap()
}
