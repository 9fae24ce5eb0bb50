use crate::domain::AccountId;
use tokio::sync::watch;

/// Source of the caller's account. Authentication happens upstream; this only
/// reports the outcome.
pub trait IdentityProvider: Send + Sync {
    fn current_account(&self) -> Option<AccountId>;

    fn is_authenticated(&self) -> bool {
        self.current_account().is_some()
    }
}

/// Fixed identity, e.g. one per HTTP request.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity {
    account: Option<AccountId>,
}

impl StaticIdentity {
    pub fn anonymous() -> Self {
        Self { account: None }
    }

    pub fn signed_in(account: impl Into<AccountId>) -> Self {
        Self {
            account: Some(account.into()),
        }
    }
}

impl From<Option<AccountId>> for StaticIdentity {
    fn from(account: Option<AccountId>) -> Self {
        Self { account }
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_account(&self) -> Option<AccountId> {
        self.account.clone()
    }
}

/// Identity that changes over the life of a session (sign-in, sign-out,
/// account switch). Observers can follow changes through `subscribe`.
#[derive(Debug)]
pub struct SessionIdentity {
    account: watch::Sender<Option<AccountId>>,
}

impl Default for SessionIdentity {
    fn default() -> Self {
        Self {
            account: watch::channel(None).0,
        }
    }
}

impl SessionIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sign_in(&self, account: impl Into<AccountId>) {
        self.account.send_replace(Some(account.into()));
    }

    pub fn sign_out(&self) {
        self.account.send_replace(None);
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<AccountId>> {
        self.account.subscribe()
    }
}

impl IdentityProvider for SessionIdentity {
    fn current_account(&self) -> Option<AccountId> {
        self.account.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_identity() {
        assert!(!StaticIdentity::anonymous().is_authenticated());
        let id = StaticIdentity::signed_in("uid-1");
        assert_eq!(id.current_account(), Some(AccountId::new("uid-1")));
    }

    #[test]
    fn session_identity_follows_sign_in_and_out() {
        let identity = SessionIdentity::new();
        let rx = identity.subscribe();
        assert!(!identity.is_authenticated());

        identity.sign_in("uid-1");
        assert_eq!(rx.borrow().as_ref().map(AccountId::as_str), Some("uid-1"));

        identity.sign_out();
        assert_eq!(identity.current_account(), None);
    }
}
