use derive_more::{Display, Error};

pub type Error = exn::Exn<ErrorKind>;
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    #[display("invalid configuration")]
    Config,
    #[display("could not open library database")]
    Database,
    #[display("could not read {_0}")]
    Read(#[error(not(source))] String),
    #[display("could not write {_0}")]
    Write(#[error(not(source))] String),
    #[display("export failed")]
    Export,
    #[display("restore failed")]
    Restore,
    #[display("not a readable archive")]
    Inspect,
}
