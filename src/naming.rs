//! Safe component naming.
//!
//! Builds a deterministic, bounded-length identifier for a component from its
//! project code, source repository and component name, usable as a resource
//! name in external systems.

use blake2::{Blake2b512, Digest};
use data_encoding::{BASE32, HEXLOWER};

use crate::error::{HandlerError, HandlerResult};

/// Maximum length of a generated name.
pub const MAX_NAME_LENGTH: usize = 64;

/// Prefix of names that had to be replaced by a digest.
pub const HASHED_NAME_PREFIX: &str = "ck-";

const REPOSITORY_HOST: &str = "github.com/";

/// Generates a safe component name.
///
/// Owner and repository names containing anything other than ASCII
/// alphanumerics and `-` are replaced by their base-32 encoding, with `=`
/// padding turned into `-`. Names longer than [`MAX_NAME_LENGTH`] become
/// [`HASHED_NAME_PREFIX`] followed by a hex BLAKE2b digest, truncated to fit.
///
/// ```
/// use extension_handler::naming::safe_component_name;
///
/// let name = safe_component_name("ck", "github.com/acme/infra", "bucket").unwrap();
/// assert_eq!(name, "ck-acme-infra-bucket");
/// ```
pub fn safe_component_name(
    project_code: &str,
    repo_id: &str,
    component_name: &str,
) -> HandlerResult<String> {
    if project_code.is_empty() {
        return Err(HandlerError::validation("project code must not be empty"));
    }
    if component_name.is_empty() {
        return Err(HandlerError::validation("component name must not be empty"));
    }

    let (owner, repo) = split_repository(repo_id)?;
    let name = format!(
        "{}-{}-{}-{}",
        project_code,
        sanitize(owner),
        sanitize(repo),
        component_name
    );

    if name.len() <= MAX_NAME_LENGTH {
        return Ok(name);
    }

    let digest = Blake2b512::digest(name.as_bytes());
    let mut hashed = format!("{}{}", HASHED_NAME_PREFIX, HEXLOWER.encode(&digest));
    hashed.truncate(MAX_NAME_LENGTH);
    Ok(hashed)
}

fn split_repository(repo_id: &str) -> HandlerResult<(&str, &str)> {
    let path = repo_id
        .strip_prefix(REPOSITORY_HOST)
        .ok_or_else(|| HandlerError::invalid_repository(repo_id))?;
    match path.split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
            Ok((owner, repo))
        }
        _ => Err(HandlerError::invalid_repository(repo_id)),
    }
}

fn sanitize(part: &str) -> String {
    if part.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        part.to_string()
    } else {
        BASE32.encode(part.as_bytes()).replace('=', "-")
    }
}
