//! Catalog flattening: one tagged document per searchable module field.

use crate::error::ResolveError;
use crate::model::types::{Document, FieldTag, Module};

/// Flatten `modules` into documents.
///
/// Per module, in catalog order: name, description, then for each command
/// its name followed by its description. Content is copied verbatim; the
/// matchers do their own normalization. An empty catalog yields no
/// documents.
pub fn flatten(modules: &[Module]) -> Vec<Document> {
    let capacity = modules.iter().map(|m| 2 + 2 * m.commands.len()).sum();
    let mut docs = Vec::with_capacity(capacity);
    let mut push = |owner_id: i64, field_tag: FieldTag, content: &str| {
        let sequence_no = docs.len() as u64;
        docs.push(Document {
            owner_id,
            sequence_no,
            field_tag,
            content: content.to_string(),
        });
    };

    for module in modules {
        push(module.id, FieldTag::Name, &module.name);
        push(module.id, FieldTag::Description, &module.description);
        for cmd in &module.commands {
            push(module.id, FieldTag::CommandName, &cmd.command);
            push(module.id, FieldTag::CommandDescription, &cmd.description);
        }
    }
    docs
}

/// Like [`flatten`], but an empty catalog is an error.
pub fn flatten_nonempty(modules: &[Module]) -> Result<Vec<Document>, ResolveError> {
    if modules.is_empty() {
        return Err(ResolveError::EmptyCatalog);
    }
    Ok(flatten(modules))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<Module> {
        vec![
            Module::new(1, "weather", "shows forecast").with_command("wget", "get weather"),
            Module::new(2, "Notes", "Keep NOTES")
                .with_command("note", "save")
                .with_command("notes", "list"),
        ]
    }

    #[test]
    fn emits_fields_in_catalog_then_command_order() {
        let docs = flatten(&catalog());
        let layout: Vec<(i64, FieldTag, &str)> = docs
            .iter()
            .map(|d| (d.owner_id, d.field_tag, d.content.as_str()))
            .collect();
        assert_eq!(
            layout,
            vec![
                (1, FieldTag::Name, "weather"),
                (1, FieldTag::Description, "shows forecast"),
                (1, FieldTag::CommandName, "wget"),
                (1, FieldTag::CommandDescription, "get weather"),
                (2, FieldTag::Name, "Notes"),
                (2, FieldTag::Description, "Keep NOTES"),
                (2, FieldTag::CommandName, "note"),
                (2, FieldTag::CommandDescription, "save"),
                (2, FieldTag::CommandName, "notes"),
                (2, FieldTag::CommandDescription, "list"),
            ]
        );
    }

    #[test]
    fn sequence_numbers_are_dense_and_unique() {
        let docs = flatten(&catalog());
        for (i, doc) in docs.iter().enumerate() {
            assert_eq!(doc.sequence_no, i as u64);
        }
    }

    #[test]
    fn keeps_empty_fields_and_case() {
        let docs = flatten(&[Module::new(3, "UPPER", "")]);
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].content, "UPPER");
        assert_eq!(docs[1].content, "");
    }

    #[test]
    fn empty_catalog() {
        assert!(flatten(&[]).is_empty());
        assert!(matches!(
            flatten_nonempty(&[]),
            Err(ResolveError::EmptyCatalog)
        ));
    }
}
