//! Account details from the invocation context.

use serde::{Deserialize, Serialize};

use crate::error::{HandlerError, HandlerResult};

/// Account number and region of the invoked function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountContext {
    /// Account number
    pub number: String,
    /// Region
    pub region: String,
}

/// Host-provided invocation context exposing the invoked function's identifier.
pub trait InvocationContext {
    /// Identifier of the form `<partition>:<service>:<region>:<account>:<resource>`.
    fn invoked_function_arn(&self) -> &str;
}

impl InvocationContext for str {
    fn invoked_function_arn(&self) -> &str {
        self
    }
}

impl InvocationContext for String {
    fn invoked_function_arn(&self) -> &str {
        self
    }
}

#[cfg(feature = "lambda")]
impl InvocationContext for lambda_runtime::Context {
    fn invoked_function_arn(&self) -> &str {
        &self.invoked_function_arn
    }
}

/// Extracts the account number and region from an invocation context.
///
/// ```
/// use extension_handler::account_context;
///
/// let account =
///     account_context("arn:aws:lambda:us-east-1:123456789012:function:deploy").unwrap();
/// assert_eq!(account.number, "123456789012");
/// assert_eq!(account.region, "us-east-1");
/// ```
pub fn account_context<C>(context: &C) -> HandlerResult<AccountContext>
where
    C: InvocationContext + ?Sized,
{
    let arn = context.invoked_function_arn();
    // arn:<partition>:<service>:<region>:<account>:<resource...>
    let parts: Vec<&str> = arn.split(':').collect();
    if parts.len() < 5 {
        return Err(HandlerError::invalid_arn(arn));
    }
    Ok(AccountContext {
        number: parts[4].to_string(),
        region: parts[3].to_string(),
    })
}
