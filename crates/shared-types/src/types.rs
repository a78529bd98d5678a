/// A single todo record as submitted by the client.
///
/// `id` is only unique within one request. Unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TodoItem {
    pub id: i64,
    pub text: String,
    pub completed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum TodoStatus {
    Done,
    Pending,
}

impl TodoStatus {
    pub fn label(&self) -> &'static str {
        match self {
            TodoStatus::Done => "Done",
            TodoStatus::Pending => "Pending",
        }
    }
}

impl From<bool> for TodoStatus {
    fn from(completed: bool) -> Self {
        if completed {
            TodoStatus::Done
        } else {
            TodoStatus::Pending
        }
    }
}

impl std::fmt::Display for TodoStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Display row for the report table: `[id, text, status]`
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TodoRow {
    pub id: String,
    pub text: String,
    pub status: TodoStatus,
}

impl TodoRow {
    /// Cells in table column order
    pub fn cells(&self) -> [String; 3] {
        [
            self.id.clone(),
            self.text.clone(),
            self.status.label().to_string(),
        ]
    }
}

impl From<&TodoItem> for TodoRow {
    fn from(item: &TodoItem) -> Self {
        Self {
            id: item.id.to_string(),
            text: item.text.clone(),
            status: item.completed.into(),
        }
    }
}
