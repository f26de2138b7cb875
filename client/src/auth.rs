//! Authorization types and candidate sources.
//!
//! A subscription is attempted with one authorization type at a time. The
//! candidates come either from a single configured type or from the
//! model's authorization rules, most specific rule first.

use std::fmt;
use std::iter::Peekable;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use syncql_engine::{AuthProvider, AuthRule, AuthStrategy};

use crate::error::CandidateError;

/// A credential mechanism accepted by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthorizationType {
    ApiKey,
    AwsIam,
    OpenidConnect,
    AmazonCognitoUserPools,
    AwsLambda,
    None,
}

impl AuthorizationType {
    /// Wire name of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthorizationType::ApiKey => "API_KEY",
            AuthorizationType::AwsIam => "AWS_IAM",
            AuthorizationType::OpenidConnect => "OPENID_CONNECT",
            AuthorizationType::AmazonCognitoUserPools => "AMAZON_COGNITO_USER_POOLS",
            AuthorizationType::AwsLambda => "AWS_LAMBDA",
            AuthorizationType::None => "NONE",
        }
    }

    /// Whether requests carry a user identity token.
    pub fn has_identity(&self) -> bool {
        matches!(
            self,
            AuthorizationType::AmazonCognitoUserPools | AuthorizationType::OpenidConnect
        )
    }

    /// The type used to satisfy a rule.
    pub fn for_rule(rule: &AuthRule) -> Self {
        match rule.provider {
            Some(AuthProvider::UserPools) => AuthorizationType::AmazonCognitoUserPools,
            Some(AuthProvider::Oidc) => AuthorizationType::OpenidConnect,
            Some(AuthProvider::Iam) => AuthorizationType::AwsIam,
            Some(AuthProvider::ApiKey) => AuthorizationType::ApiKey,
            Some(AuthProvider::Function) => AuthorizationType::AwsLambda,
            None => match rule.strategy {
                AuthStrategy::Owner | AuthStrategy::Group | AuthStrategy::Private => {
                    AuthorizationType::AmazonCognitoUserPools
                }
                AuthStrategy::Public => AuthorizationType::ApiKey,
                AuthStrategy::Custom => AuthorizationType::AwsLambda,
            },
        }
    }
}

impl fmt::Display for AuthorizationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unknown authorization type name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown authorization type: {0}")]
pub struct UnknownAuthorizationType(pub String);

impl FromStr for AuthorizationType {
    type Err = UnknownAuthorizationType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "API_KEY" => Ok(AuthorizationType::ApiKey),
            "AWS_IAM" => Ok(AuthorizationType::AwsIam),
            "OPENID_CONNECT" => Ok(AuthorizationType::OpenidConnect),
            "AMAZON_COGNITO_USER_POOLS" => Ok(AuthorizationType::AmazonCognitoUserPools),
            "AWS_LAMBDA" => Ok(AuthorizationType::AwsLambda),
            "NONE" => Ok(AuthorizationType::None),
            _ => Err(UnknownAuthorizationType(s.to_string())),
        }
    }
}

/// One rule-derived authorization candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthCandidate {
    pub auth_type: AuthorizationType,
    /// Strategy of the rule the candidate was derived from
    pub strategy: AuthStrategy,
}

impl AuthCandidate {
    pub fn new(auth_type: AuthorizationType, strategy: AuthStrategy) -> Self {
        Self {
            auth_type,
            strategy,
        }
    }

    pub fn is_owner(&self) -> bool {
        self.strategy == AuthStrategy::Owner
    }
}

type CandidateIter = Box<dyn Iterator<Item = Result<AuthCandidate, CandidateError>> + Send>;

/// An ordered, possibly unbounded sequence of rule-derived candidates.
///
/// An `Err` item means the sequence could not be enumerated consistently.
pub struct RuleCandidates {
    inner: Peekable<CandidateIter>,
}

impl RuleCandidates {
    pub fn new<I>(candidates: I) -> Self
    where
        I: IntoIterator<Item = Result<AuthCandidate, CandidateError>>,
        I::IntoIter: Send + 'static,
    {
        let iter: CandidateIter = Box::new(candidates.into_iter());
        Self {
            inner: iter.peekable(),
        }
    }

    /// Derive candidates from a model's rules.
    ///
    /// Rules are tried most specific first (owner, group, private, public,
    /// custom), keeping declaration order within a strategy. Repeated
    /// `(type, strategy)` pairs are tried once.
    pub fn from_rules(rules: &[AuthRule]) -> Self {
        let mut ordered: Vec<&AuthRule> = rules.iter().collect();
        ordered.sort_by_key(|rule| strategy_priority(rule.strategy));

        let mut candidates: Vec<AuthCandidate> = Vec::with_capacity(ordered.len());
        for rule in ordered {
            let candidate = AuthCandidate::new(AuthorizationType::for_rule(rule), rule.strategy);
            if !candidates.contains(&candidate) {
                candidates.push(candidate);
            }
        }

        Self::new(candidates.into_iter().map(Ok))
    }

    /// Whether another candidate remains.
    pub fn has_next(&mut self) -> bool {
        self.inner.peek().is_some()
    }
}

impl Iterator for RuleCandidates {
    type Item = Result<AuthCandidate, CandidateError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}

impl fmt::Debug for RuleCandidates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleCandidates").finish_non_exhaustive()
    }
}

fn strategy_priority(strategy: AuthStrategy) -> u8 {
    match strategy {
        AuthStrategy::Owner => 0,
        AuthStrategy::Group => 1,
        AuthStrategy::Private => 2,
        AuthStrategy::Public => 3,
        AuthStrategy::Custom => 4,
    }
}

/// Where a subscription takes its authorization candidates from.
#[derive(Debug)]
pub enum AuthCandidates {
    /// A single configured type, always decorated.
    Fixed(AuthorizationType),
    /// Candidates derived from the model's rules; only owner-derived
    /// candidates are decorated.
    RuleDerived(RuleCandidates),
}

impl fmt::Display for AuthCandidates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthCandidates::Fixed(auth_type) => write!(f, "[{}]", auth_type),
            AuthCandidates::RuleDerived(_) => f.write_str("[rule-derived]"),
        }
    }
}

/// A single attempt the orchestrator makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Attempt {
    pub auth_type: AuthorizationType,
    pub decorate: bool,
}

/// Consuming cursor over a candidate source.
#[derive(Debug)]
pub(crate) enum CandidateCursor {
    Fixed(Option<AuthorizationType>),
    RuleDerived(RuleCandidates),
}

impl From<AuthCandidates> for CandidateCursor {
    fn from(candidates: AuthCandidates) -> Self {
        match candidates {
            AuthCandidates::Fixed(auth_type) => CandidateCursor::Fixed(Some(auth_type)),
            AuthCandidates::RuleDerived(rules) => CandidateCursor::RuleDerived(rules),
        }
    }
}

impl CandidateCursor {
    pub fn next_attempt(&mut self) -> Option<Result<Attempt, CandidateError>> {
        match self {
            CandidateCursor::Fixed(slot) => slot.take().map(|auth_type| {
                Ok(Attempt {
                    auth_type,
                    decorate: true,
                })
            }),
            CandidateCursor::RuleDerived(rules) => rules.next().map(|candidate| {
                candidate.map(|c| Attempt {
                    auth_type: c.auth_type,
                    decorate: c.is_owner(),
                })
            }),
        }
    }

    pub fn has_next(&mut self) -> bool {
        match self {
            CandidateCursor::Fixed(slot) => slot.is_some(),
            CandidateCursor::RuleDerived(rules) => rules.has_next(),
        }
    }
}
