use super::blocks::Block;

#[derive(Debug, Clone)]
pub struct Section {
    /// `None` for whatever precedes the first label.
    pub label: Option<String>,
    pub blocks: Vec<Block>,
}

/// Cluster a flat Vec<Block> into sections, one per label marker.
pub fn cluster_sections(blocks: &[Block]) -> Vec<Section> {
    let mut sections: Vec<Section> = Vec::new();
    let mut current = Section {
        label: None,
        blocks: Vec::new(),
    };

    for block in blocks {
        if let Block::Label { name, .. } = block {
            let finished = std::mem::replace(
                &mut current,
                Section {
                    label: Some(name.clone()),
                    blocks: Vec::new(),
                },
            );
            if finished.label.is_some() || !finished.blocks.is_empty() {
                sections.push(finished);
            }
        }
        current.blocks.push(block.clone());
    }

    if current.label.is_some() || !current.blocks.is_empty() {
        sections.push(current);
    }

    sections
}

impl Section {
    pub fn is_labeled(&self, label: &str) -> bool {
        self.label
            .as_deref()
            .is_some_and(|l| l.to_lowercase() == label.to_lowercase())
    }

    /// Everything after the marker up to the next label, trimmed.
    pub fn text(&self) -> String {
        self.blocks
            .iter()
            .map(|b| match b {
                Block::Label { inline, .. } => inline.clone(),
                Block::Checkbox { checked, text } => {
                    format!("- [{}] {}", if *checked { "x" } else { " " }, text)
                }
                Block::Text(t) => t.clone(),
                Block::Empty => String::new(),
            })
            .collect::<Vec<_>>()
            .join("\n")
            .trim()
            .to_string()
    }

    pub fn checked(&self) -> Vec<String> {
        self.blocks
            .iter()
            .filter_map(|b| match b {
                Block::Checkbox { checked: true, text } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }
}
