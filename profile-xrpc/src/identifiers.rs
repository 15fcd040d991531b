use anyhow::{anyhow, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use std::str::FromStr;

/// Namespaced identifier naming an XRPC method, like `app.bsky.actor.getProfile`.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Nsid(String);

impl FromStr for Nsid {
    type Err = anyhow::Error;

    /// Reverse-DNS authority segments followed by a final name segment.
    ///
    /// Lazy partial regex, doesn't enforce segment length limits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lazy_static! {
            static ref NSID_RE: Regex =
                Regex::new(r"^[a-z][a-z0-9-]*(\.[a-z][a-z0-9-]*)+\.[a-zA-Z][a-zA-Z0-9]*$")
                    .unwrap();
        }
        if NSID_RE.is_match(s) {
            Ok(Nsid(s.to_string()))
        } else {
            Err(anyhow!("does not match as an NSID: {}", s))
        }
    }
}

impl fmt::Display for Nsid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[test]
fn test_nsid() {
    assert_eq!(
        Nsid::from_str("com.atproto.server.createSession")
            .unwrap()
            .to_string(),
        "com.atproto.server.createSession"
    );
    assert!(Nsid::from_str("app.bsky.actor.getProfile").is_ok());
    assert!(Nsid::from_str("io.example.v2.thing").is_ok());

    assert!(Nsid::from_str("").is_err());
    assert!(Nsid::from_str("getProfile").is_err());
    assert!(Nsid::from_str("app.bsky..getProfile").is_err());
    assert!(Nsid::from_str("app.bsky.actor.get-profile").is_err());
    assert!(Nsid::from_str("did:plc:bv6ggog3tya2z3vxsub7hnal").is_err());
}
