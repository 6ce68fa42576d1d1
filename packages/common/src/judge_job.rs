use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

/// Test data source: inline text or a file reference read at judge time.
///
/// On the wire an inline payload is a plain JSON string, a reference is
/// `{ "path": "..." }`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TestPayload {
    Inline(String),
    File { path: PathBuf },
}

impl TestPayload {
    /// Resolve the payload to its text content.
    pub async fn load(&self) -> std::io::Result<String> {
        match self {
            Self::Inline(text) => Ok(text.clone()),
            Self::File { path } => tokio::fs::read_to_string(path).await,
        }
    }
}

impl From<&str> for TestPayload {
    fn from(text: &str) -> Self {
        Self::Inline(text.to_string())
    }
}

impl From<String> for TestPayload {
    fn from(text: String) -> Self {
        Self::Inline(text)
    }
}

/// One test case in stored order.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseData {
    /// Stable position assigned when the problem was created. Starts at 1; a missing
    /// ordinal in a judge request is filled from the list position.
    #[serde(default)]
    pub ordinal: u32,
    #[serde(alias = "inputRef")]
    pub input: TestPayload,
    #[serde(alias = "expectedOutputRef")]
    pub expected_output: TestPayload,
}

impl TestCaseData {
    pub fn new(
        ordinal: u32,
        input: impl Into<TestPayload>,
        expected_output: impl Into<TestPayload>,
    ) -> Self {
        Self {
            ordinal,
            input: input.into(),
            expected_output: expected_output.into(),
        }
    }
}

/// Run one program against one input.
///
/// `language` stays a raw identifier so unknown values reach the backend and come back
/// as a typed rejection instead of a deserialization failure.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequest {
    pub code: String,
    pub language: String,
    #[serde(default)]
    pub stdin: String,
}

/// Judge one submission against an ordered list of test cases.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JudgeRequest {
    pub code: String,
    pub language: String,
    #[serde(deserialize_with = "ordered_test_cases")]
    pub test_cases: Vec<TestCaseData>,
}

fn ordered_test_cases<'de, D>(deserializer: D) -> Result<Vec<TestCaseData>, D::Error>
where
    D: Deserializer<'de>,
{
    let mut cases = Vec::<TestCaseData>::deserialize(deserializer)?;
    for (position, case) in cases.iter_mut().enumerate() {
        if case.ordinal == 0 {
            case.ordinal = position as u32 + 1;
        }
    }
    Ok(cases)
}

/// Interactive "try" request with custom input.
///
/// Without `expected_output` the program is executed and its output returned as-is.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SampleRunRequest {
    pub code: String,
    pub language: String,
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub expected_output: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_payload_wire_forms() {
        let case: TestCaseData = serde_json::from_str(
            r#"{"ordinal":1,"input":"1 2\n","expectedOutput":{"path":"/data/1.out"}}"#,
        )
        .unwrap();
        assert_eq!(case.input, TestPayload::Inline("1 2\n".into()));
        assert_eq!(
            case.expected_output,
            TestPayload::File {
                path: PathBuf::from("/data/1.out")
            }
        );
    }

    #[tokio::test]
    async fn test_load_file_payload() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "3\n").unwrap();
        let payload = TestPayload::File {
            path: file.path().to_path_buf(),
        };
        assert_eq!(payload.load().await.unwrap(), "3\n");
    }

    #[tokio::test]
    async fn test_load_missing_file_fails() {
        let payload = TestPayload::File {
            path: PathBuf::from("/nonexistent/judge/case.in"),
        };
        assert!(payload.load().await.is_err());
    }

    #[test]
    fn test_reference_field_names_and_positional_ordinals() {
        let req: JudgeRequest = serde_json::from_str(
            r#"{"code":"","language":"python","testCases":[
                {"inputRef":"1","expectedOutputRef":"one"},
                {"inputRef":{"path":"/data/2.in"},"expectedOutputRef":{"path":"/data/2.out"}}
            ]}"#,
        )
        .unwrap();
        let ordinals: Vec<u32> = req.test_cases.iter().map(|tc| tc.ordinal).collect();
        assert_eq!(ordinals, vec![1, 2]);
        assert_eq!(req.test_cases[0].input, TestPayload::Inline("1".into()));
        assert_eq!(req.test_cases[0].expected_output, TestPayload::Inline("one".into()));
        assert_eq!(
            req.test_cases[1].input,
            TestPayload::File {
                path: PathBuf::from("/data/2.in")
            }
        );
    }

    #[test]
    fn test_explicit_ordinals_are_kept() {
        let req: JudgeRequest = serde_json::from_str(
            r#"{"code":"","language":"cpp","testCases":[
                {"ordinal":7,"input":"a","expectedOutput":"A"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(req.test_cases[0].ordinal, 7);
    }

    #[test]
    fn test_execute_request_defaults_stdin() {
        let req: ExecuteRequest =
            serde_json::from_str(r#"{"code":"print(1)","language":"python"}"#).unwrap();
        assert!(req.stdin.is_empty());
    }
}
