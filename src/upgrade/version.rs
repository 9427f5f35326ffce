use semver::{BuildMetadata, Version};

use crate::error::{Result, UpgradeError};

/// Parse a version string as published in `version.json` or compiled into a binary.
///
/// Accepts a leading `v`/`V` and surrounding whitespace, and pads purely numeric
/// `1` / `1.2` forms to a full `major.minor.patch`. Everything else must be
/// valid semver, pre-release and build metadata included.
pub fn parse_version(input: &str) -> Result<Version> {
    let trimmed = input.trim();
    let bare = trimmed.strip_prefix(['v', 'V']).unwrap_or(trimmed);

    let numeric = |part: &str| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit());
    let padded = match bare.split('.').collect::<Vec<_>>().as_slice() {
        [major] if numeric(*major) => Some(format!("{major}.0.0")),
        [major, minor] if numeric(*major) && numeric(*minor) => {
            Some(format!("{major}.{minor}.0"))
        }
        _ => None,
    };

    Version::parse(padded.as_deref().unwrap_or(bare)).map_err(|source| {
        UpgradeError::VersionParse {
            input: input.to_string(),
            source,
        }
    })
}

/// `true` when `a` has strictly lower semver precedence than `b`.
///
/// Build metadata does not take part in precedence, so `1.0.0+a` and `1.0.0+b`
/// are equal here even though `Version`'s `Ord` tells them apart.
pub fn precedes(a: &Version, b: &Version) -> bool {
    let without_build = |v: &Version| Version {
        build: BuildMetadata::EMPTY,
        ..v.clone()
    };
    without_build(a) < without_build(b)
}

/// `true` when `a` has strictly lower semver precedence than `b`.
///
/// Equal versions are not older, so no update is offered when current == latest.
pub fn is_older_than(a: &str, b: &str) -> Result<bool> {
    Ok(precedes(&parse_version(a)?, &parse_version(b)?))
}
