use sqlx::{Encode, Postgres, QueryBuilder, Type};

use crate::common::error::AppError;

// ---
// Helper de UPDATE parcial
// ---
/// Monta `UPDATE <tabela> SET ...` apenas com os campos presentes.
///
/// Os nomes de coluna são sempre `&'static str` vindos do código, nunca das
/// chaves da requisição. `finish` falha com `NoFieldsToUpdate` quando nenhum
/// campo foi informado, antes de qualquer ida ao banco.
pub struct PartialUpdate<'args> {
    builder: QueryBuilder<'args, Postgres>,
    fields: usize,
}

impl<'args> PartialUpdate<'args> {
    pub fn new(table: &'static str) -> Self {
        let mut builder = QueryBuilder::new("UPDATE ");
        builder.push(table).push(" SET ");
        Self { builder, fields: 0 }
    }

    /// Adiciona `column = $n` se o valor estiver presente.
    pub fn set<T>(&mut self, column: &'static str, value: Option<T>) -> &mut Self
    where
        T: 'args + Encode<'args, Postgres> + Type<Postgres> + Send,
    {
        if let Some(value) = value {
            if self.fields > 0 {
                self.builder.push(", ");
            }
            self.builder.push(column).push(" = ").push_bind(value);
            self.fields += 1;
        }
        self
    }

    /// Igual a `set`, mas grava o valor aparado e uma string vazia conta
    /// como ausente. Usado para colunas de texto NOT NULL.
    pub fn set_non_empty(&mut self, column: &'static str, value: Option<String>) -> &mut Self {
        self.set(
            column,
            value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()),
        )
    }

    pub fn field_count(&self) -> usize {
        self.fields
    }

    /// Fecha a lista do SET com `updated_at = NOW()` e devolve o builder
    /// para o chamador acrescentar o WHERE e o RETURNING.
    pub fn finish(mut self) -> Result<QueryBuilder<'args, Postgres>, AppError> {
        if self.fields == 0 {
            return Err(AppError::NoFieldsToUpdate);
        }
        self.builder.push(", updated_at = NOW()");
        Ok(self.builder)
    }
}

// ---
// Classificação de erros do driver
// ---
/// Nome da constraint UNIQUE violada, se for esse o erro.
pub fn unique_violation(err: &sqlx::Error) -> Option<String> {
    match err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            Some(db_err.constraint().unwrap_or_default().to_string())
        }
        _ => None,
    }
}

pub fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation())
}
