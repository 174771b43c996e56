use std::fmt::{self, Display, Formatter};

pub type Result<T, E = Error> = anyhow::Result<T, E>;
pub type Error = anyhow::Error;

/// Broad category of a failure, recoverable from any error produced by this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The statement could not be built (e.g. offset without limit, empty identifier).
    Build,
    /// The execution provider rejected the operation (prepare, bind, step, connect).
    Provider,
    /// A result value does not fit the declared Rust type.
    Decode,
    /// The bound values do not match the placeholders of the compiled statement.
    Arity,
}

impl ErrorKind {
    /// New error of this kind carrying `message`.
    pub fn error(self, message: impl Into<String>) -> Error {
        Error::new(KindError {
            kind: self,
            message: message.into(),
        })
    }

    /// The first kind found walking the error chain from the outermost context.
    pub fn of(error: &Error) -> Option<ErrorKind> {
        error
            .chain()
            .find_map(|e| e.downcast_ref::<KindError>())
            .map(|e| e.kind)
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::Build => "build error",
            ErrorKind::Provider => "provider error",
            ErrorKind::Decode => "decode error",
            ErrorKind::Arity => "arity error",
        })
    }
}

#[derive(Debug)]
pub struct KindError {
    pub kind: ErrorKind,
    pub message: String,
}

impl Display for KindError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for KindError {}

#[cfg(test)]
mod tests {
    use super::ErrorKind;
    use anyhow::Context;

    #[test]
    fn kind_survives_context() {
        let error = Err::<(), _>(ErrorKind::Decode.error("not a date"))
            .context("While decoding column 2")
            .unwrap_err();
        assert_eq!(ErrorKind::of(&error), Some(ErrorKind::Decode));
        assert_eq!(format!("{:#}", error), "While decoding column 2: decode error: not a date");
        assert_eq!(ErrorKind::of(&anyhow::anyhow!("plain")), None);
    }
}
