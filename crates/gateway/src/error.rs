/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The credential was rejected by the endpoint.
    Auth,
    /// The endpoint is rate limited or the quota is exhausted.
    RateLimited,
    /// Any other errors.
    Other,
}
