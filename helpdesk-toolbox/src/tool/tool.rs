use std::fmt::Debug;
use std::sync::Arc;
use async_trait::async_trait;
use crate::knowledge::knowledge::KnowledgeBase;

/// Something an agent can call between reasoning steps.
///
/// Tools never fail: problems are reported back to the model as text so it can
/// recover on the next iteration.
#[async_trait]
pub trait Tool: Send + Sync + Debug {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    async fn call(&self, input: &str) -> String;
}

#[derive(Clone, Debug, Default)]
pub struct ToolBox {
    items: Vec<Arc<dyn Tool>>,
}

impl ToolBox {

    pub fn new(items: Vec<Arc<dyn Tool>>) -> Self {
        Self { items }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.items.iter().find(|t| t.name() == name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        self.items.iter().map(|t| t.name()).collect()
    }

    /// One `name: description` line per tool.
    pub fn descriptions(&self) -> String {
        self.items.iter()
            .map(|t| format!("{}: {}", t.name(), t.description()))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A tool answered from the embedded knowledge base.
#[derive(Clone, Debug)]
pub struct KnowledgeTool {
    name: &'static str,
    description: &'static str,
    knowledge: Arc<KnowledgeBase>,
    lookup: fn(&KnowledgeBase, &str) -> String,
}

impl KnowledgeTool {
    pub fn new(
        name: &'static str,
        description: &'static str,
        knowledge: Arc<KnowledgeBase>,
        lookup: fn(&KnowledgeBase, &str) -> String,
    ) -> Self {
        Self { name, description, knowledge, lookup }
    }
}

#[async_trait]
impl Tool for KnowledgeTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    async fn call(&self, input: &str) -> String {
        (self.lookup)(&self.knowledge, input.trim())
    }
}

/// Splits `"left;right"` into trimmed, lower-cased halves.
pub fn split_pair(input: &str) -> Option<(String, String)> {
    let mut parts = input.split(';');
    let left = parts.next()?.trim().to_lowercase();
    let right = parts.next()?.trim().to_lowercase();
    if parts.next().is_some() {
        return None;
    }
    Some((left, right))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_pair() {
        assert_eq!(split_pair("Laptop; Won't power on"), Some((String::from("laptop"), String::from("won't power on"))));
        assert_eq!(split_pair("laptop"), None);
        assert_eq!(split_pair("a;b;c"), None);
    }

    #[tokio::test]
    async fn test_toolbox_lookup_and_descriptions() {
        let knowledge = Arc::new(KnowledgeBase::embedded().unwrap());
        let tool: Arc<dyn Tool> = Arc::new(KnowledgeTool::new(
            "echo",
            "Echoes its input.",
            knowledge,
            |_, input| format!("echo: {}", input),
        ));
        let toolbox = ToolBox::new(vec![tool]);

        assert_eq!(toolbox.names(), vec!["echo"]);
        assert_eq!(toolbox.descriptions(), "echo: Echoes its input.");
        assert!(toolbox.get("missing").is_none());

        let echo = toolbox.get("echo").unwrap();
        assert_eq!(echo.call("  hi  ").await, "echo: hi");
    }
}
