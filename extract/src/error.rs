use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("extract: empty image")]
    EmptyImage,

    #[error("extract: failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("extract: recognizer exited with {}: {stderr}", describe_exit(.code))]
    Exit { code: Option<i32>, stderr: String },

    #[error("extract: malformed recognizer output: {0}")]
    MalformedOutput(String),

    #[error("extract: I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "signal".to_string(),
    }
}
