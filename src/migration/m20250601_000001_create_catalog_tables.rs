// ABOUTME: Initial migration creating users, plants, categories, locations, registrations,
// ABOUTME: images, comments and ratings, with cascade foreign keys and uniqueness constraints

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Usuarios::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Usuarios::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Usuarios::Nome).string().not_null())
                    .col(ColumnDef::new(Usuarios::Email).string().not_null().unique_key())
                    .col(ColumnDef::new(Usuarios::SenhaHash).string().not_null())
                    .col(ColumnDef::new(Usuarios::Perfil).string_len(16).not_null())
                    .col(ColumnDef::new(Usuarios::AvatarUrl).string())
                    .col(ColumnDef::new(Usuarios::Reputacao).integer().not_null().default(0))
                    .col(ColumnDef::new(Usuarios::CreatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Plantas::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Plantas::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Plantas::NomePopular).string().not_null())
                    .col(ColumnDef::new(Plantas::NomeCientifico).string())
                    .col(ColumnDef::new(Plantas::Descricao).text().not_null())
                    .col(ColumnDef::new(Plantas::Comestivel).boolean().not_null().default(false))
                    .col(ColumnDef::new(Plantas::Medicinal).boolean().not_null().default(false))
                    .col(ColumnDef::new(Plantas::Nativa).boolean().not_null().default(true))
                    .col(ColumnDef::new(Plantas::Usos).text())
                    .col(ColumnDef::new(Plantas::Cuidados).text())
                    .col(ColumnDef::new(Plantas::CreatedAt).big_integer().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Categorias::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Categorias::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Categorias::Nome).string().not_null().unique_key())
                    .col(ColumnDef::new(Categorias::Descricao).string())
                    .col(ColumnDef::new(Categorias::Tipo).string_len(16).not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PlantaCategorias::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(PlantaCategorias::PlantaId).uuid().not_null())
                    .col(ColumnDef::new(PlantaCategorias::CategoriaId).uuid().not_null())
                    .primary_key(
                        Index::create()
                            .col(PlantaCategorias::PlantaId)
                            .col(PlantaCategorias::CategoriaId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_planta_categorias_planta_id")
                            .from(PlantaCategorias::Table, PlantaCategorias::PlantaId)
                            .to(Plantas::Table, Plantas::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_planta_categorias_categoria_id")
                            .from(PlantaCategorias::Table, PlantaCategorias::CategoriaId)
                            .to(Categorias::Table, Categorias::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Localizacoes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Localizacoes::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Localizacoes::Latitude).double().not_null())
                    .col(ColumnDef::new(Localizacoes::Longitude).double().not_null())
                    .col(ColumnDef::new(Localizacoes::Endereco).string())
                    .col(ColumnDef::new(Localizacoes::Descricao).string())
                    .col(ColumnDef::new(Localizacoes::Regiao).string())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Registros::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Registros::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Registros::UsuarioId).uuid().not_null())
                    .col(ColumnDef::new(Registros::PlantaId).uuid().not_null())
                    .col(ColumnDef::new(Registros::LocalizacaoId).uuid().not_null())
                    .col(ColumnDef::new(Registros::Status).string_len(16).not_null())
                    .col(ColumnDef::new(Registros::Observacoes).text())
                    .col(ColumnDef::new(Registros::MotivoRejeicao).text())
                    .col(ColumnDef::new(Registros::CreatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_registros_usuario_id")
                            .from(Registros::Table, Registros::UsuarioId)
                            .to(Usuarios::Table, Usuarios::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_registros_planta_id")
                            .from(Registros::Table, Registros::PlantaId)
                            .to(Plantas::Table, Plantas::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_registros_localizacao_id")
                            .from(Registros::Table, Registros::LocalizacaoId)
                            .to(Localizacoes::Table, Localizacoes::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_registros_status")
                    .table(Registros::Table)
                    .col(Registros::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Imagens::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Imagens::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Imagens::RegistroId).uuid().not_null())
                    .col(ColumnDef::new(Imagens::Url).string().not_null())
                    .col(ColumnDef::new(Imagens::NomeArquivo).string().not_null())
                    .col(ColumnDef::new(Imagens::ContentType).string().not_null())
                    .col(ColumnDef::new(Imagens::Tamanho).big_integer().not_null())
                    .col(ColumnDef::new(Imagens::CreatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_imagens_registro_id")
                            .from(Imagens::Table, Imagens::RegistroId)
                            .to(Registros::Table, Registros::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Comentarios::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Comentarios::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Comentarios::UsuarioId).uuid().not_null())
                    .col(ColumnDef::new(Comentarios::RegistroId).uuid().not_null())
                    .col(ColumnDef::new(Comentarios::Texto).text().not_null())
                    .col(ColumnDef::new(Comentarios::Avaliacao).integer())
                    .col(ColumnDef::new(Comentarios::Editado).boolean().not_null().default(false))
                    .col(ColumnDef::new(Comentarios::CreatedAt).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comentarios_usuario_id")
                            .from(Comentarios::Table, Comentarios::UsuarioId)
                            .to(Usuarios::Table, Usuarios::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comentarios_registro_id")
                            .from(Comentarios::Table, Comentarios::RegistroId)
                            .to(Registros::Table, Registros::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Avaliacoes::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Avaliacoes::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Avaliacoes::UsuarioId).uuid().not_null())
                    .col(ColumnDef::new(Avaliacoes::PlantaId).uuid().not_null())
                    .col(ColumnDef::new(Avaliacoes::Valor).integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_avaliacoes_usuario_id")
                            .from(Avaliacoes::Table, Avaliacoes::UsuarioId)
                            .to(Usuarios::Table, Usuarios::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_avaliacoes_planta_id")
                            .from(Avaliacoes::Table, Avaliacoes::PlantaId)
                            .to(Plantas::Table, Plantas::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .index(
                        Index::create()
                            .name("idx_avaliacao_usuario_planta_unique")
                            .table(Avaliacoes::Table)
                            .col(Avaliacoes::UsuarioId)
                            .col(Avaliacoes::PlantaId)
                            .unique(),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Avaliacoes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Comentarios::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Imagens::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Registros::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Localizacoes::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PlantaCategorias::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Categorias::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Plantas::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Usuarios::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Usuarios {
    Table,
    Id,
    Nome,
    Email,
    SenhaHash,
    Perfil,
    AvatarUrl,
    Reputacao,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Plantas {
    Table,
    Id,
    NomePopular,
    NomeCientifico,
    Descricao,
    Comestivel,
    Medicinal,
    Nativa,
    Usos,
    Cuidados,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Categorias {
    Table,
    Id,
    Nome,
    Descricao,
    Tipo,
}

#[derive(DeriveIden)]
enum PlantaCategorias {
    Table,
    PlantaId,
    CategoriaId,
}

#[derive(DeriveIden)]
enum Localizacoes {
    Table,
    Id,
    Latitude,
    Longitude,
    Endereco,
    Descricao,
    Regiao,
}

#[derive(DeriveIden)]
enum Registros {
    Table,
    Id,
    UsuarioId,
    PlantaId,
    LocalizacaoId,
    Status,
    Observacoes,
    MotivoRejeicao,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Imagens {
    Table,
    Id,
    RegistroId,
    Url,
    NomeArquivo,
    ContentType,
    Tamanho,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Comentarios {
    Table,
    Id,
    UsuarioId,
    RegistroId,
    Texto,
    Avaliacao,
    Editado,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Avaliacoes {
    Table,
    Id,
    UsuarioId,
    PlantaId,
    Valor,
}
