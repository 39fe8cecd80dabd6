// ABOUTME: Service-level tests for the storage layer
// ABOUTME: Covers registration transactions, rating upserts, search, moderation and cascades

#[cfg(test)]
mod tests {
    use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
    use tempfile::TempDir;
    use uuid::Uuid;

    use crate::entities::{
        category, comment, image, location, plant_category, rating,
        registration::{self, StatusRegistro},
        user,
    };
    use crate::error::AppError;
    use crate::storage::Storage;
    use crate::types::{CreatePlantaRequest, FiltroPlantas, PlantUpdateFields, StoredUpload};

    async fn create_test_storage() -> (Storage, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");
        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());
        let storage = Storage::new(&db_url).await.unwrap();
        (storage, temp_dir)
    }

    async fn create_test_user(storage: &Storage, nome: &str, email: &str) -> user::Model {
        storage.create_user(nome, email, "hash").await.unwrap()
    }

    fn planta_request(nome: &str, lat: f64, lon: f64) -> CreatePlantaRequest {
        CreatePlantaRequest {
            nome_popular: Some(nome.to_string()),
            descricao: Some(format!("{nome} é uma planta comum em áreas urbanas do cerrado")),
            categoria: vec!["COMESTIVEL".to_string(), "NATIVA".to_string()],
            comestivel: Some(true),
            latitude: Some(lat),
            longitude: Some(lon),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_user_operations() {
        let (storage, _temp_dir) = create_test_storage().await;

        let usuario = create_test_user(&storage, "Maria Silva", "maria@x.com").await;
        assert_eq!(usuario.perfil, user::PerfilUsuario::Usuario);
        assert_eq!(usuario.reputacao, 0);

        let found = storage.find_user_by_email("maria@x.com").await.unwrap();
        assert_eq!(found.unwrap().id, usuario.id);

        let missing = storage.find_user_by_email("ninguem@x.com").await.unwrap();
        assert!(missing.is_none());

        let updated = storage
            .update_profile(
                usuario.id,
                crate::types::ProfileUpdateFields {
                    nome: Some("Maria Souza".to_string()),
                    avatar_url: Some(Some("/uploads/avatares/m.png".to_string())),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.nome, "Maria Souza");
        assert_eq!(updated.avatar_url.as_deref(), Some("/uploads/avatares/m.png"));
        // Email untouched by the partial update
        assert_eq!(updated.email, "maria@x.com");

        let (plantas, comentarios) = storage.profile_counts(usuario.id).await.unwrap();
        assert_eq!((plantas, comentarios), (0, 0));
    }

    #[tokio::test]
    async fn test_register_plant_creates_full_graph() {
        let (storage, _temp_dir) = create_test_storage().await;
        let usuario = create_test_user(&storage, "Ana", "ana@x.com").await;

        let view = storage
            .register_plant(
                usuario.id,
                planta_request("Pitangueira", -15.79, -47.88),
                vec![StoredUpload {
                    url: "/uploads/plantas/planta-1-1.jpg".to_string(),
                    nome_arquivo: "pitanga.jpg".to_string(),
                    content_type: "image/jpeg".to_string(),
                    tamanho: 1024,
                }],
            )
            .await
            .unwrap();

        assert_eq!(view.nome_popular, "Pitangueira");
        assert_eq!(view.status, StatusRegistro::Pendente);
        assert_eq!(view.total_registros, 1);
        assert_eq!(view.total_avaliacoes, 0);
        assert_eq!(view.avaliacao_media, 0.0);
        assert_eq!(view.usuario_registro.nome, "Ana");
        assert_eq!(view.imagem_url.as_deref(), Some("/uploads/plantas/planta-1-1.jpg"));

        let mut nomes: Vec<_> = view.categorias.iter().map(|c| c.nome.clone()).collect();
        nomes.sort();
        assert_eq!(nomes, vec!["COMESTIVEL", "NATIVA"]);

        assert_eq!(view.localizacoes.len(), 1);
        assert_eq!(view.localizacoes[0].latitude, -15.79);
        assert_eq!(view.localizacoes[0].longitude, -47.88);

        // Same projection through get_plant
        let again = storage.get_plant(view.id).await.unwrap();
        assert_eq!(again.id, view.id);
        assert_eq!(again.status, StatusRegistro::Pendente);
    }

    #[tokio::test]
    async fn test_register_plant_aggregates_validation_errors() {
        let (storage, _temp_dir) = create_test_storage().await;
        let usuario = create_test_user(&storage, "Ana", "ana@x.com").await;

        let result = storage
            .register_plant(usuario.id, CreatePlantaRequest::default(), vec![])
            .await;

        match result {
            Err(AppError::Validation(msgs)) => {
                assert!(msgs.contains(&"Nome popular é obrigatório".to_string()));
                assert!(msgs.contains(&"Descrição é obrigatória".to_string()));
                assert!(msgs.contains(&"Pelo menos uma categoria é obrigatória".to_string()));
                assert!(msgs.contains(&"Latitude é obrigatória".to_string()));
                assert!(msgs.contains(&"Longitude é obrigatória".to_string()));
            }
            other => panic!("expected validation error, got {other:?}"),
        }

        // The failed call must not leave partial rows behind
        let plantas = crate::entities::plant::Entity::find()
            .count(&storage.db)
            .await
            .unwrap();
        assert_eq!(plantas, 0);
    }

    #[tokio::test]
    async fn test_register_plant_rejects_unknown_category() {
        let (storage, _temp_dir) = create_test_storage().await;
        let usuario = create_test_user(&storage, "Ana", "ana@x.com").await;

        let mut request = planta_request("Boldo", -15.0, -47.0);
        request.categoria = vec!["INEXISTENTE".to_string()];

        let result = storage.register_plant(usuario.id, request, vec![]).await;
        match result {
            Err(AppError::Validation(msgs)) => {
                assert!(msgs.iter().any(|m| m.contains("Categoria inválida")));
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_category_upsert_is_idempotent() {
        let (storage, _temp_dir) = create_test_storage().await;
        let usuario = create_test_user(&storage, "Ana", "ana@x.com").await;

        storage
            .register_plant(usuario.id, planta_request("Pitangueira", -15.79, -47.88), vec![])
            .await
            .unwrap();
        storage
            .register_plant(usuario.id, planta_request("Amoreira", -15.80, -47.89), vec![])
            .await
            .unwrap();

        let nativas = category::Entity::find()
            .filter(category::Column::Nome.eq("NATIVA"))
            .count(&storage.db)
            .await
            .unwrap();
        assert_eq!(nativas, 1);
    }

    #[tokio::test]
    async fn test_rating_upsert_keeps_single_row_with_latest_value() {
        let (storage, _temp_dir) = create_test_storage().await;
        let usuario = create_test_user(&storage, "Ana", "ana@x.com").await;
        let view = storage
            .register_plant(usuario.id, planta_request("Pitangueira", -15.79, -47.88), vec![])
            .await
            .unwrap();

        storage.rate_plant(usuario.id, view.id, 3, None).await.unwrap();
        storage.rate_plant(usuario.id, view.id, 5, None).await.unwrap();

        let rows = rating::Entity::find()
            .filter(rating::Column::PlantaId.eq(view.id))
            .all(&storage.db)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].valor, 5);

        let again = storage.get_plant(view.id).await.unwrap();
        assert_eq!(again.avaliacao_media, 5.0);
        assert_eq!(again.total_avaliacoes, 1);
    }

    #[tokio::test]
    async fn test_rating_average_over_multiple_users() {
        let (storage, _temp_dir) = create_test_storage().await;
        let ana = create_test_user(&storage, "Ana", "ana@x.com").await;
        let bia = create_test_user(&storage, "Bia", "bia@x.com").await;
        let view = storage
            .register_plant(ana.id, planta_request("Pitangueira", -15.79, -47.88), vec![])
            .await
            .unwrap();

        storage.rate_plant(ana.id, view.id, 4, None).await.unwrap();
        storage.rate_plant(bia.id, view.id, 2, None).await.unwrap();

        let again = storage.get_plant(view.id).await.unwrap();
        assert_eq!(again.avaliacao_media, 3.0);
        assert_eq!(again.total_avaliacoes, 2);
    }

    #[tokio::test]
    async fn test_rating_comment_attaches_to_latest_registration() {
        let (storage, _temp_dir) = create_test_storage().await;
        let usuario = create_test_user(&storage, "Ana", "ana@x.com").await;
        let view = storage
            .register_plant(usuario.id, planta_request("Pitangueira", -15.79, -47.88), vec![])
            .await
            .unwrap();

        storage
            .rate_plant(usuario.id, view.id, 5, Some("Frutos deliciosos".to_string()))
            .await
            .unwrap();

        let registro = registration::Entity::find()
            .filter(registration::Column::PlantaId.eq(view.id))
            .one(&storage.db)
            .await
            .unwrap()
            .unwrap();
        let comentarios = comment::Entity::find()
            .filter(comment::Column::RegistroId.eq(registro.id))
            .all(&storage.db)
            .await
            .unwrap();
        assert_eq!(comentarios.len(), 1);
        assert_eq!(comentarios[0].texto, "Frutos deliciosos");
        assert_eq!(comentarios[0].avaliacao, Some(5));
    }

    #[tokio::test]
    async fn test_search_boolean_and_text_filters() {
        let (storage, _temp_dir) = create_test_storage().await;
        let usuario = create_test_user(&storage, "Ana", "ana@x.com").await;

        storage
            .register_plant(usuario.id, planta_request("Pitangueira", -15.79, -47.88), vec![])
            .await
            .unwrap();

        let mut boldo = planta_request("Sete Dores", -15.80, -47.89);
        boldo.descricao =
            Some("Conhecida popularmente como boldo, usada em chás digestivos".to_string());
        boldo.comestivel = Some(false);
        boldo.categoria = vec!["MEDICINAL".to_string()];
        storage.register_plant(usuario.id, boldo, vec![]).await.unwrap();

        let comestiveis = storage
            .search_plants(FiltroPlantas {
                comestivel: Some(true),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(comestiveis.total, 1);
        assert_eq!(comestiveis.data[0].nome_popular, "Pitangueira");

        // Case-insensitive match against the description, not the name
        let por_texto = storage
            .search_plants(FiltroPlantas {
                search: Some("Boldo".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(por_texto.total, 1);
        assert_eq!(por_texto.data[0].nome_popular, "Sete Dores");

        let por_categoria = storage
            .search_plants(FiltroPlantas {
                categoria: vec!["MEDICINAL".to_string()],
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(por_categoria.total, 1);
        assert_eq!(por_categoria.data[0].nome_popular, "Sete Dores");
    }

    #[tokio::test]
    async fn test_search_pagination_orders_by_name() {
        let (storage, _temp_dir) = create_test_storage().await;
        let usuario = create_test_user(&storage, "Ana", "ana@x.com").await;

        for nome in ["Caju", "Amora", "Butiá"] {
            storage
                .register_plant(usuario.id, planta_request(nome, -15.79, -47.88), vec![])
                .await
                .unwrap();
        }

        let page1 = storage
            .search_plants(FiltroPlantas {
                limit: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page1.total, 3);
        assert_eq!(page1.total_pages, 2);
        assert_eq!(page1.data[0].nome_popular, "Amora");
        assert_eq!(page1.data[1].nome_popular, "Butiá");

        let page2 = storage
            .search_plants(FiltroPlantas {
                page: Some(2),
                limit: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page2.data.len(), 1);
        assert_eq!(page2.data[0].nome_popular, "Caju");
    }

    #[tokio::test]
    async fn test_search_geo_filter_paginates_filtered_set() {
        let (storage, _temp_dir) = create_test_storage().await;
        let usuario = create_test_user(&storage, "Ana", "ana@x.com").await;

        // Two plants within ~1.2 km of the reference, one ~20 km away
        storage
            .register_plant(usuario.id, planta_request("Perto A", -15.79, -47.88), vec![])
            .await
            .unwrap();
        storage
            .register_plant(usuario.id, planta_request("Perto B", -15.80, -47.88), vec![])
            .await
            .unwrap();
        storage
            .register_plant(usuario.id, planta_request("Longe", -15.97, -47.88), vec![])
            .await
            .unwrap();

        let result = storage
            .search_plants(FiltroPlantas {
                latitude: Some(-15.79),
                longitude: Some(-47.88),
                raio_km: Some(5.0),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(result.total, 2);
        let nomes: Vec<_> = result.data.iter().map(|p| p.nome_popular.clone()).collect();
        assert!(nomes.contains(&"Perto A".to_string()));
        assert!(nomes.contains(&"Perto B".to_string()));
    }

    #[tokio::test]
    async fn test_search_nearby_orders_by_distance_and_cuts_radius() {
        let (storage, _temp_dir) = create_test_storage().await;
        let usuario = create_test_user(&storage, "Ana", "ana@x.com").await;

        storage
            .register_plant(usuario.id, planta_request("Mais Perto", -15.791, -47.88), vec![])
            .await
            .unwrap();
        storage
            .register_plant(usuario.id, planta_request("Perto", -15.80, -47.88), vec![])
            .await
            .unwrap();
        storage
            .register_plant(usuario.id, planta_request("Longe", -15.97, -47.88), vec![])
            .await
            .unwrap();

        let result = storage
            .search_nearby(-15.79, -47.88, Some(5.0), None)
            .await
            .unwrap();

        assert_eq!(result.len(), 2);
        assert_eq!(result[0].nome_popular, "Mais Perto");
        assert_eq!(result[1].nome_popular, "Perto");
    }

    #[tokio::test]
    async fn test_moderation_state_machine() {
        let (storage, _temp_dir) = create_test_storage().await;
        let usuario = create_test_user(&storage, "Ana", "ana@x.com").await;
        let moderador = create_test_user(&storage, "Mod", "mod@x.com").await;

        let view = storage
            .register_plant(usuario.id, planta_request("Pitangueira", -15.79, -47.88), vec![])
            .await
            .unwrap();
        let registro = registration::Entity::find()
            .filter(registration::Column::PlantaId.eq(view.id))
            .one(&storage.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(registro.status, StatusRegistro::Pendente);

        let pendentes = storage.list_pending().await.unwrap();
        assert_eq!(pendentes.len(), 1);
        assert_eq!(pendentes[0].planta.nome_popular, "Pitangueira");

        let em_analise = storage
            .set_registration_status(registro.id, StatusRegistro::EmAnalise, moderador.id, None)
            .await
            .unwrap();
        assert_eq!(em_analise.status, StatusRegistro::EmAnalise);

        let aprovado = storage
            .set_registration_status(registro.id, StatusRegistro::Aprovado, moderador.id, None)
            .await
            .unwrap();
        assert_eq!(aprovado.status, StatusRegistro::Aprovado);

        // Approval awards reputation to the submitting user
        let ana = storage.get_user(usuario.id).await.unwrap();
        assert!(ana.reputacao > 0);

        // Re-approving is an idempotent no-op
        let again = storage
            .set_registration_status(registro.id, StatusRegistro::Aprovado, moderador.id, None)
            .await
            .unwrap();
        assert_eq!(again.status, StatusRegistro::Aprovado);

        // Leaving a terminal state is a conflict
        let conflito = storage
            .set_registration_status(registro.id, StatusRegistro::Rejeitado, moderador.id, None)
            .await;
        assert!(matches!(conflito, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_rejection_skips_review_and_persists_reason() {
        let (storage, _temp_dir) = create_test_storage().await;
        let usuario = create_test_user(&storage, "Ana", "ana@x.com").await;
        let moderador = create_test_user(&storage, "Mod", "mod@x.com").await;

        let view = storage
            .register_plant(usuario.id, planta_request("Pitangueira", -15.79, -47.88), vec![])
            .await
            .unwrap();
        let registro = registration::Entity::find()
            .filter(registration::Column::PlantaId.eq(view.id))
            .one(&storage.db)
            .await
            .unwrap()
            .unwrap();

        // PENDENTE -> REJEITADO without passing through EM_ANALISE
        let rejeitado = storage
            .set_registration_status(
                registro.id,
                StatusRegistro::Rejeitado,
                moderador.id,
                Some("Foto ilegível".to_string()),
            )
            .await
            .unwrap();
        assert_eq!(rejeitado.status, StatusRegistro::Rejeitado);
        assert_eq!(rejeitado.motivo_rejeicao.as_deref(), Some("Foto ilegível"));
    }

    #[tokio::test]
    async fn test_delete_plant_cascades() {
        let (storage, _temp_dir) = create_test_storage().await;
        let usuario = create_test_user(&storage, "Ana", "ana@x.com").await;

        let view = storage
            .register_plant(
                usuario.id,
                planta_request("Pitangueira", -15.79, -47.88),
                vec![StoredUpload {
                    url: "/uploads/plantas/planta-1-1.jpg".to_string(),
                    nome_arquivo: "pitanga.jpg".to_string(),
                    content_type: "image/jpeg".to_string(),
                    tamanho: 1024,
                }],
            )
            .await
            .unwrap();
        storage
            .rate_plant(usuario.id, view.id, 5, Some("Ótima".to_string()))
            .await
            .unwrap();

        storage.delete_plant(view.id).await.unwrap();

        assert!(matches!(
            storage.get_plant(view.id).await,
            Err(AppError::NotFound(_))
        ));
        let db = &storage.db;
        assert_eq!(registration::Entity::find().count(db).await.unwrap(), 0);
        assert_eq!(location::Entity::find().count(db).await.unwrap(), 0);
        assert_eq!(image::Entity::find().count(db).await.unwrap(), 0);
        assert_eq!(comment::Entity::find().count(db).await.unwrap(), 0);
        assert_eq!(rating::Entity::find().count(db).await.unwrap(), 0);
        assert_eq!(plant_category::Entity::find().count(db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_update_plant_merges_only_present_fields() {
        let (storage, _temp_dir) = create_test_storage().await;
        let usuario = create_test_user(&storage, "Ana", "ana@x.com").await;

        let mut request = planta_request("Pitangueira", -15.79, -47.88);
        request.nome_cientifico = Some("Eugenia uniflora".to_string());
        let view = storage.register_plant(usuario.id, request, vec![]).await.unwrap();

        let updated = storage
            .update_plant(
                view.id,
                PlantUpdateFields {
                    medicinal: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.medicinal);
        assert_eq!(updated.nome_popular, "Pitangueira");
        assert_eq!(updated.nome_cientifico.as_deref(), Some("Eugenia uniflora"));

        // Explicit null clears a nullable column
        let cleared = storage
            .update_plant(
                view.id,
                PlantUpdateFields {
                    nome_cientifico: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(cleared.nome_cientifico, None);
    }

    #[tokio::test]
    async fn test_get_missing_plant_is_not_found() {
        let (storage, _temp_dir) = create_test_storage().await;
        let result = storage.get_plant(Uuid::new_v4()).await;
        match result {
            Err(AppError::NotFound(msg)) => assert_eq!(msg, "Planta não encontrada"),
            other => panic!("expected not found, got {other:?}"),
        }
    }
}
