//! Account, region and ARN helpers shared by all mock services.

use std::fmt;

/// Implements `as_str`, `AsRef<str>`, `Display` and a `DEFAULT`-backed
/// `Default` for a `String` newtype.
macro_rules! string_newtype {
    ($name:ident) => {
        impl $name {
            /// Borrow the underlying string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self($name::DEFAULT.to_owned())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

/// Twelve-digit account number stamped into ARNs and identity responses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String")]
pub struct AccountId(String);

impl AccountId {
    /// Account reported when `DEFAULT_ACCOUNT_ID` is unset.
    pub const DEFAULT: &str = "000000000000";

    /// # Errors
    /// [`CloudMockError::InvalidAccountId`](crate::CloudMockError::InvalidAccountId)
    /// unless `id` is exactly twelve ASCII digits.
    pub fn new(id: impl Into<String>) -> Result<Self, crate::CloudMockError> {
        let id = id.into();
        match id.bytes().filter(u8::is_ascii_digit).count() {
            12 if id.len() == 12 => Ok(Self(id)),
            _ => Err(crate::CloudMockError::InvalidAccountId(id)),
        }
    }
}

string_newtype!(AccountId);

impl TryFrom<String> for AccountId {
    type Error = crate::CloudMockError;

    fn try_from(id: String) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}

/// Region name echoed back in ARNs and queue URLs. Not validated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct AwsRegion(String);

impl AwsRegion {
    /// Region used when `DEFAULT_REGION` is unset.
    pub const DEFAULT: &str = "us-east-1";

    /// Wrap a region name as-is.
    #[must_use]
    pub fn new(region: impl Into<String>) -> Self {
        Self(region.into())
    }
}

string_newtype!(AwsRegion);

/// Format an ARN in the standard `aws` partition.
///
/// Global services (S3, IAM, CloudFront) pass `None` for the region and/or
/// account, which leaves the corresponding ARN field empty.
#[must_use]
pub fn arn(
    service: &str,
    region: Option<&AwsRegion>,
    account: Option<&AccountId>,
    resource: &str,
) -> String {
    format!(
        "arn:aws:{service}:{}:{}:{resource}",
        region.map_or("", AwsRegion::as_str),
        account.map_or("", AccountId::as_str),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_accept_twelve_digit_account() {
        let account = AccountId::new("210987654321").unwrap();
        assert_eq!(account.to_string(), "210987654321");
    }

    #[test]
    fn test_should_reject_malformed_accounts() {
        for bad in ["", "12345", "12345678901a", "1234567890123", "+12345678901"] {
            assert!(AccountId::new(bad).is_err(), "{bad:?} accepted");
        }
    }

    #[test]
    fn test_should_validate_account_when_deserializing() {
        let account: AccountId = serde_json::from_str("\"111122223333\"").unwrap();
        assert_eq!(account.as_str(), "111122223333");
        assert!(serde_json::from_str::<AccountId>("\"12345\"").is_err());
        assert_eq!(serde_json::to_string(&account).unwrap(), "\"111122223333\"");
    }

    #[test]
    fn test_should_fall_back_to_default_identity() {
        assert_eq!(AwsRegion::default().as_ref(), AwsRegion::DEFAULT);
        assert_eq!(AccountId::default().as_str(), AccountId::DEFAULT);
    }

    #[test]
    fn test_should_format_regional_arn() {
        let arn = arn(
            "sqs",
            Some(&AwsRegion::new("eu-west-1")),
            Some(&AccountId::default()),
            "orders",
        );
        assert_eq!(arn, "arn:aws:sqs:eu-west-1:000000000000:orders");
    }

    #[test]
    fn test_should_format_global_arn_with_empty_fields() {
        assert_eq!(arn("s3", None, None, "my-bucket"), "arn:aws:s3:::my-bucket");
    }
}
