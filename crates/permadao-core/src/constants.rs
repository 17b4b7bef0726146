//! Protocol constants. Token amounts are whole, indivisible units.

/// Fixed-point padding applied to the conviction decay factor.
pub const PADD: u64 = 10;

/// Conviction retention numerator. Each step keeps
/// `CONV_ALPHA / PADD / 10` of the previous conviction.
pub const CONV_ALPHA: u64 = 90;

/// Number of steps assumed to have elapsed before the first stake on a proposal.
pub const TIME_UNIT: u64 = 1;

/// Exact length of an address or content reference (base64url of 32 bytes).
pub const ADDRESS_LEN: usize = 43;

/// Maximum number of characters in a proposal name.
pub const MAX_PROPOSAL_NAME_LEN: usize = 25;

/// Every proposal URL must start with this prefix.
pub const URL_SCHEME_PREFIX: &str = "https://";

/// Tag name carrying the media type of referenced content.
pub const CONTENT_TYPE_TAG: &str = "Content-Type";

/// Media type the referenced content must declare.
pub const MANIFEST_CONTENT_TYPE: &str = "application/x.arweave-manifest+json";

/// Largest total supply whose amounts are all exactly representable as `f64`.
///
/// Conviction is accumulated in double precision; amounts above 2^53 - 1
/// would lose integer precision when folded into the recurrence.
pub const MAX_SAFE_SUPPLY: u64 = (1 << 53) - 1;
