/// An expected substructure of a statistics document was missing or had the
/// wrong shape.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("expected a mapping at `{path}`, found a {found}")]
    NotAMapping { path: String, found: &'static str },

    #[error("expected a sequence of records at `{path}`, found a {found}")]
    NotASequence { path: String, found: &'static str },

    #[error("record {index} at `{path}` is missing field `{field}`")]
    MissingField {
        path: String,
        index: usize,
        field: &'static str,
    },

    #[error("expected a numeric counter at `{path}`, found a {found}")]
    NotANumber { path: String, found: &'static str },
}
