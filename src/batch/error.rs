use thiserror::Error;

/// 잡 실행을 중단시키는 에러, 아이템 단위 처리 실패([`JobProcessFailed`])는 여기에 포함되지 않는다.
#[derive(Debug, Error)]
pub enum JobRuntimeError {
    #[error("read failed: {0}")]
    ReadFailed(#[from] JobReadFailed),

    #[error("write failed: {0}")]
    WriteFailed(#[from] JobWriteFailed),
}

#[derive(Debug, Error)]
pub enum JobReadFailed {
    #[error("Invalid input, {0}")]
    InvalidInput(String),
}

/// 아이템 하나의 처리 실패, 실패한 아이템과 사유를 함께 가진다.
pub struct JobProcessFailed<I> {
    item: I,
    message: String,
}

impl<I> JobProcessFailed<I> {

    pub fn new(item: I, message: String) -> Self {
        JobProcessFailed { item, message }
    }

    pub fn item(&self) -> &I {
        &self.item
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn into_item(self) -> I {
        self.item
    }
}

impl<I> std::fmt::Display for JobProcessFailed<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl<I> std::fmt::Debug for JobProcessFailed<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl<I> std::error::Error for JobProcessFailed<I> {}

#[derive(Debug, Error)]
#[error("{message}")]
pub struct JobWriteFailed {
    message: String,
}

impl JobWriteFailed {
    pub fn new(message: &str) -> Self {
        JobWriteFailed { message: message.to_owned() }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
