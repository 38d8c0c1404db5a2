//! View and edit dialogs plus the confirmation prompts the viewer raises.

use records::{Filters, Record};

#[cfg(test)]
#[path = "dialog_test.rs"]
mod dialog_test;

pub const DISCARD_PROMPT: &str = "Existem alterações não salvas. Deseja descartá-las?";
pub const DELETE_ALL_PROMPT: &str = "ATENÇÃO: Você tem certeza que deseja APAGAR TODOS os registros do banco de dados?\n\n\
     ESTA AÇÃO É IRREVERSÍVEL! TODOS OS DADOS SERÃO PERDIDOS.";
pub const EMPTY_PROCEDURE: &str = "O procedimento não pode ficar vazio.";
pub const EDIT_FAILED: &str = "Não foi possível salvar o procedimento.";
pub const DELETE_FAILED: &str = "Não foi possível apagar o registro.";
pub const DELETE_ALL_FAILED: &str = "Não foi possível apagar os registros.";

/// Single-record delete prompt; names the id being deleted.
#[must_use]
pub fn delete_prompt(id: i64) -> String {
    format!("Tem certeza que deseja apagar o registro ID {id}?")
}

/// Read-only detail of one cached record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewDialog {
    pub record: Record,
    /// Id the dialog's delete action targets.
    pub delete_target: i64,
    /// Filters active when the dialog opened, preserved across its delete.
    pub filters: Filters,
}

/// Procedure editor for one record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditDialog {
    pub id: i64,
    pub original: String,
    pub current: String,
    pub dirty: bool,
    pub submitting: bool,
    pub error: Option<String>,
}

impl EditDialog {
    #[must_use]
    pub fn new(id: i64, text: &str) -> Self {
        Self {
            id,
            original: text.to_owned(),
            current: text.to_owned(),
            dirty: false,
            submitting: false,
            error: None,
        }
    }

    pub fn input(&mut self, text: &str) {
        text.clone_into(&mut self.current);
        self.dirty = self.current != self.original;
    }
}
