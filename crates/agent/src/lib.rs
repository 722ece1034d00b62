//! The agent loop: the heart of Incant.
//!
//! One invocation turns one user input into one answer:
//!
//! 1. **Start**: load history from the store (if any), append the input,
//!    resolve the tool catalog once
//! 2. **Generate**: send every turn plus the catalog to the backend and
//!    decode the reply with the agent's tool-call protocol
//! 3. **Invoke**: run the requested tool, append the call and its result,
//!    and go back to 2; a `return_direct` tool ends the invocation instead
//! 4. **Done**: free text is the answer, saved to the store as one exchange
//!
//! The loop is strictly sequential and holds no state between invocations.

pub mod loop_runner;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use loop_runner::{Agent, tool_not_found_message};
