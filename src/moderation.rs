// ABOUTME: Moderation queue and registration status state machine
// ABOUTME: PENDENTE -> EM_ANALISE -> {APROVADO, REJEITADO}; terminal states never change

use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::entities::{
    location, plant,
    registration::{self, StatusRegistro},
    user,
};
use crate::error::{AppError, Result};
use crate::storage::Storage;
use crate::types::{PendingRegistrationView, PlantaResumo, UsuarioResumo};

/// Reputation awarded to the submitting user when a registration is approved.
const APPROVAL_REPUTATION_AWARD: i32 = 5;

pub const DEFAULT_REJECTION_REASON: &str = "Motivo não especificado";

fn transition_allowed(from: StatusRegistro, to: StatusRegistro) -> bool {
    matches!(
        (from, to),
        (StatusRegistro::Pendente, StatusRegistro::EmAnalise)
            | (StatusRegistro::Pendente, StatusRegistro::Aprovado)
            | (StatusRegistro::Pendente, StatusRegistro::Rejeitado)
            | (StatusRegistro::EmAnalise, StatusRegistro::Aprovado)
            | (StatusRegistro::EmAnalise, StatusRegistro::Rejeitado)
    )
}

impl Storage {
    pub async fn list_pending(&self) -> Result<Vec<PendingRegistrationView>> {
        let registros = registration::Entity::find()
            .filter(registration::Column::Status.eq(StatusRegistro::Pendente))
            .order_by_asc(registration::Column::CreatedAt)
            .all(&self.db)
            .await?;

        let mut views = Vec::new();
        for registro in registros {
            let planta = plant::Entity::find_by_id(registro.planta_id)
                .one(&self.db)
                .await?
                .ok_or_else(|| AppError::Internal("Registro sem planta".to_string()))?;
            let usuario = user::Entity::find_by_id(registro.usuario_id)
                .one(&self.db)
                .await?
                .ok_or_else(|| AppError::Internal("Registro sem usuário".to_string()))?;
            let localizacao = location::Entity::find_by_id(registro.localizacao_id)
                .one(&self.db)
                .await?
                .ok_or_else(|| AppError::Internal("Registro sem localização".to_string()))?;

            views.push(PendingRegistrationView {
                id: registro.id,
                status: registro.status,
                observacoes: registro.observacoes,
                data_registro: registro.created_at,
                planta: PlantaResumo {
                    id: planta.id,
                    nome_popular: planta.nome_popular,
                },
                usuario: UsuarioResumo {
                    id: usuario.id.to_string(),
                    nome: usuario.nome,
                },
                localizacao,
            });
        }
        Ok(views)
    }

    /// Applies a moderation status transition. Re-setting the current status
    /// is an idempotent no-op; leaving a terminal status is a conflict. On
    /// approval the submitting user earns reputation; on rejection the reason
    /// is persisted alongside the registration.
    pub async fn set_registration_status(
        &self,
        registro_id: Uuid,
        status: StatusRegistro,
        moderator_id: Uuid,
        motivo: Option<String>,
    ) -> Result<registration::Model> {
        let registro = registration::Entity::find_by_id(registro_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Registro não encontrado".to_string()))?;

        if registro.status == status {
            return Ok(registro);
        }
        if registro.status.is_terminal() {
            return Err(AppError::Conflict(
                "Registro já foi moderado e não pode mudar de status".to_string(),
            ));
        }
        if !transition_allowed(registro.status, status) {
            return Err(AppError::Conflict("Transição de status inválida".to_string()));
        }

        let txn = self.db.begin().await?;

        let usuario_id = registro.usuario_id;
        let mut active: registration::ActiveModel = registro.into();
        active.status = Set(status);
        if status == StatusRegistro::Rejeitado {
            active.motivo_rejeicao =
                Set(Some(motivo.unwrap_or_else(|| DEFAULT_REJECTION_REASON.to_string())));
        }
        let updated = active.update(&txn).await?;

        if status == StatusRegistro::Aprovado {
            let usuario = user::Entity::find_by_id(usuario_id)
                .one(&txn)
                .await?
                .ok_or_else(|| AppError::Internal("Registro sem usuário".to_string()))?;
            let reputacao = usuario.reputacao + APPROVAL_REPUTATION_AWARD;
            let mut usuario_active: user::ActiveModel = usuario.into();
            usuario_active.reputacao = Set(reputacao);
            usuario_active.update(&txn).await?;
        }

        txn.commit().await?;

        tracing::info!(
            registro = %registro_id,
            moderador = %moderator_id,
            status = ?status,
            "status de moderação atualizado"
        );

        Ok(updated)
    }
}
