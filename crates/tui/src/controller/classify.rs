use crate::client::ClientError;

/// Where a failed request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context {
    /// Passive view refresh (`me`, accounts, statement).
    Refresh,
    /// User-initiated mutation (login, register, account creation, operation).
    Mutation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// No response was obtained; nothing can be said about the session.
    Transport,
    /// The server rejected a mutation; `message` goes to the user verbatim.
    Domain { message: String },
    /// A refresh was rejected: the session is treated as expired.
    Auth,
}

pub fn classify(context: Context, err: &ClientError) -> Failure {
    match (context, err) {
        (_, ClientError::Transport(_)) => Failure::Transport,
        (Context::Refresh, _) => Failure::Auth,
        (Context::Mutation, err) => Failure::Domain {
            message: err.to_string(),
        },
    }
}

/// Text shown to the user for a failed mutation.
pub fn user_message(failure: &Failure) -> String {
    match failure {
        Failure::Transport => "Error: server unreachable".to_string(),
        Failure::Domain { message } => format!("Error: {message}"),
        Failure::Auth => "Error: session expired".to_string(),
    }
}
