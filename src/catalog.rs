// ABOUTME: Plant catalog operations: search, proximity, registration, update, delete, rating
// ABOUTME: Multi-entity writes run inside one transaction; category upsert is conflict-safe

use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait,
    ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
    sea_query::OnConflict,
};
use uuid::Uuid;

use crate::entities::{
    category::{self, TipoCategoria},
    comment, image, location, plant, plant_category, rating,
    registration::{self, StatusRegistro},
    user,
};
use crate::error::{AppError, Result};
use crate::geo;
use crate::storage::Storage;
use crate::types::{
    CreatePlantaRequest, FiltroPlantas, PaginatedResponse, PlantUpdateFields, PlantView,
    StoredUpload, UsuarioResumo,
};

const DEFAULT_PAGE_SIZE: u64 = 20;
const DEFAULT_NEARBY_RADIUS_KM: f64 = 5.0;
const DEFAULT_NEARBY_LIMIT: usize = 50;

/// Create payload after aggregated validation; every required field is present.
struct ValidatedPlanta {
    nome_popular: String,
    nome_cientifico: Option<String>,
    descricao: String,
    categorias: Vec<(String, TipoCategoria)>,
    comestivel: bool,
    medicinal: bool,
    nativa: bool,
    usos: Option<String>,
    cuidados: Option<String>,
    latitude: f64,
    longitude: f64,
    endereco: Option<String>,
    descricao_local: Option<String>,
    regiao: Option<String>,
    observacoes: Option<String>,
}

fn validate_create(data: CreatePlantaRequest) -> Result<ValidatedPlanta> {
    let mut errors = Vec::new();

    let nome_popular = match data.nome_popular.as_deref().map(str::trim) {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => {
            errors.push("Nome popular é obrigatório".to_string());
            String::new()
        }
    };

    let descricao = match data.descricao.as_deref().map(str::trim) {
        Some(d) if d.len() >= 20 => d.to_string(),
        Some(d) if !d.is_empty() => {
            errors.push("Descrição deve ter no mínimo 20 caracteres".to_string());
            d.to_string()
        }
        _ => {
            errors.push("Descrição é obrigatória".to_string());
            String::new()
        }
    };

    let mut categorias = Vec::new();
    if data.categoria.is_empty() {
        errors.push("Pelo menos uma categoria é obrigatória".to_string());
    } else {
        for nome in &data.categoria {
            match TipoCategoria::from_name(nome) {
                Some(tipo) => categorias.push((nome.clone(), tipo)),
                None => errors.push(format!("Categoria inválida: {nome}")),
            }
        }
    }

    let latitude = match data.latitude {
        Some(lat) if (-90.0..=90.0).contains(&lat) => lat,
        Some(_) => {
            errors.push("Latitude inválida".to_string());
            0.0
        }
        None => {
            errors.push("Latitude é obrigatória".to_string());
            0.0
        }
    };

    let longitude = match data.longitude {
        Some(lon) if (-180.0..=180.0).contains(&lon) => lon,
        Some(_) => {
            errors.push("Longitude inválida".to_string());
            0.0
        }
        None => {
            errors.push("Longitude é obrigatória".to_string());
            0.0
        }
    };

    if !errors.is_empty() {
        return Err(AppError::Validation(errors));
    }

    Ok(ValidatedPlanta {
        nome_popular,
        nome_cientifico: data.nome_cientifico,
        descricao,
        categorias,
        comestivel: data.comestivel.unwrap_or(false),
        medicinal: data.medicinal.unwrap_or(false),
        nativa: data.nativa.unwrap_or(true),
        usos: data.usos,
        cuidados: data.cuidados,
        latitude,
        longitude,
        endereco: data.endereco,
        descricao_local: data.descricao_local,
        regiao: data.regiao,
        observacoes: data.observacoes,
    })
}

/// Looks a category up by name, creating it when absent. The unique index on
/// the name plus insert-on-conflict keeps concurrent calls from producing
/// duplicates.
async fn upsert_category<C: ConnectionTrait>(
    conn: &C,
    nome: &str,
    tipo: TipoCategoria,
) -> Result<category::Model> {
    if let Some(existing) = category::Entity::find()
        .filter(category::Column::Nome.eq(nome))
        .one(conn)
        .await?
    {
        return Ok(existing);
    }

    let insert = category::Entity::insert(category::ActiveModel {
        id: Set(Uuid::new_v4()),
        nome: Set(nome.to_string()),
        descricao: Set(Some(format!("Categoria {}", nome.to_lowercase()))),
        tipo: Set(tipo),
    })
    .on_conflict(
        OnConflict::column(category::Column::Nome)
            .do_nothing()
            .to_owned(),
    )
    .exec(conn)
    .await;

    match insert {
        Ok(_) | Err(DbErr::RecordNotInserted) => {}
        Err(e) => return Err(e.into()),
    }

    category::Entity::find()
        .filter(category::Column::Nome.eq(nome))
        .one(conn)
        .await?
        .ok_or_else(|| AppError::Internal(format!("Categoria {nome} sumiu após o upsert")))
}

impl Storage {
    /// Filtered, paginated plant search. With a geo filter the candidates are
    /// distance-filtered first and pagination runs over the filtered set;
    /// without one, pagination is pushed down to the database.
    pub async fn search_plants(
        &self,
        filtros: FiltroPlantas,
    ) -> Result<PaginatedResponse<PlantView>> {
        let page = filtros.page.unwrap_or(1).max(1);
        let limit = filtros.limit.unwrap_or(DEFAULT_PAGE_SIZE).max(1);

        let mut cond = Condition::all();

        if let Some(search) = &filtros.search {
            cond = cond.add(
                Condition::any()
                    .add(plant::Column::NomePopular.contains(search))
                    .add(plant::Column::NomeCientifico.contains(search))
                    .add(plant::Column::Descricao.contains(search)),
            );
        }
        if let Some(comestivel) = filtros.comestivel {
            cond = cond.add(plant::Column::Comestivel.eq(comestivel));
        }
        if let Some(medicinal) = filtros.medicinal {
            cond = cond.add(plant::Column::Medicinal.eq(medicinal));
        }
        if let Some(nativa) = filtros.nativa {
            cond = cond.add(plant::Column::Nativa.eq(nativa));
        }

        if !filtros.categoria.is_empty() {
            let categoria_ids: Vec<Uuid> = category::Entity::find()
                .filter(category::Column::Nome.is_in(filtros.categoria.clone()))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|c| c.id)
                .collect();
            let planta_ids: Vec<Uuid> = plant_category::Entity::find()
                .filter(plant_category::Column::CategoriaId.is_in(categoria_ids))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|pc| pc.planta_id)
                .collect();
            cond = cond.add(plant::Column::Id.is_in(planta_ids));
        }

        let geo_filter = match (filtros.latitude, filtros.longitude, filtros.raio_km) {
            (Some(lat), Some(lon), Some(raio)) => Some((lat, lon, raio)),
            _ => None,
        };

        if let Some((lat, lon, raio_km)) = geo_filter {
            // Distance filtering cannot run in SQL, so fetch the candidate set,
            // keep plants with at least one registration in range, then paginate.
            let candidates = plant::Entity::find()
                .filter(cond)
                .order_by_asc(plant::Column::NomePopular)
                .all(&self.db)
                .await?;

            let mut in_range = Vec::new();
            for planta in candidates {
                let locations = self.registration_locations(planta.id).await?;
                let within = locations
                    .iter()
                    .any(|(_, loc)| geo::distance_km(lat, lon, loc.latitude, loc.longitude) <= raio_km);
                if within {
                    in_range.push(planta);
                }
            }

            let total = in_range.len() as u64;
            let skip = ((page - 1) * limit) as usize;
            let mut data = Vec::new();
            for planta in in_range.into_iter().skip(skip).take(limit as usize) {
                data.push(self.plant_view(planta).await?);
            }

            return Ok(PaginatedResponse {
                data,
                total,
                page,
                limit,
                total_pages: total.div_ceil(limit),
            });
        }

        let paginator = plant::Entity::find()
            .filter(cond)
            .order_by_asc(plant::Column::NomePopular)
            .paginate(&self.db, limit);
        let total = paginator.num_items().await?;
        let plantas = paginator.fetch_page(page - 1).await?;

        let mut data = Vec::new();
        for planta in plantas {
            data.push(self.plant_view(planta).await?);
        }

        Ok(PaginatedResponse {
            data,
            total,
            page,
            limit,
            total_pages: total.div_ceil(limit),
        })
    }

    /// Full-scan proximity search: minimum registration distance per plant,
    /// radius cutoff, nearest first.
    pub async fn search_nearby(
        &self,
        latitude: f64,
        longitude: f64,
        raio_km: Option<f64>,
        limit: Option<usize>,
    ) -> Result<Vec<PlantView>> {
        let raio_km = raio_km.unwrap_or(DEFAULT_NEARBY_RADIUS_KM);
        let limit = limit.unwrap_or(DEFAULT_NEARBY_LIMIT);

        let todas = plant::Entity::find().all(&self.db).await?;

        let mut com_distancia = Vec::new();
        for planta in todas {
            let locations = self.registration_locations(planta.id).await?;
            let distancia = locations
                .iter()
                .map(|(_, loc)| geo::distance_km(latitude, longitude, loc.latitude, loc.longitude))
                .fold(f64::INFINITY, f64::min);
            if distancia <= raio_km {
                com_distancia.push((planta, distancia));
            }
        }

        com_distancia.sort_by(|a, b| a.1.total_cmp(&b.1));
        com_distancia.truncate(limit);

        let mut views = Vec::new();
        for (planta, _) in com_distancia {
            views.push(self.plant_view(planta).await?);
        }
        Ok(views)
    }

    pub async fn get_plant(&self, id: Uuid) -> Result<PlantView> {
        let planta = plant::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Planta não encontrada".to_string()))?;
        self.plant_view(planta).await
    }

    /// Registers a plant sighting as one atomic transaction: categories are
    /// upserted by name, then the plant, join rows, location, registration
    /// (status PENDENTE) and image rows are created. Any failure rolls back
    /// every row.
    pub async fn register_plant(
        &self,
        user_id: Uuid,
        data: CreatePlantaRequest,
        images: Vec<StoredUpload>,
    ) -> Result<PlantView> {
        let data = validate_create(data)?;
        let now = chrono::Utc::now().timestamp_millis();

        let txn = self.db.begin().await?;

        let mut categorias = Vec::new();
        for (nome, tipo) in &data.categorias {
            categorias.push(upsert_category(&txn, nome, *tipo).await?);
        }

        let planta_id = Uuid::new_v4();
        plant::ActiveModel {
            id: Set(planta_id),
            nome_popular: Set(data.nome_popular),
            nome_cientifico: Set(data.nome_cientifico),
            descricao: Set(data.descricao),
            comestivel: Set(data.comestivel),
            medicinal: Set(data.medicinal),
            nativa: Set(data.nativa),
            usos: Set(data.usos),
            cuidados: Set(data.cuidados),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        for categoria in &categorias {
            plant_category::ActiveModel {
                planta_id: Set(planta_id),
                categoria_id: Set(categoria.id),
            }
            .insert(&txn)
            .await?;
        }

        let localizacao_id = Uuid::new_v4();
        location::ActiveModel {
            id: Set(localizacao_id),
            latitude: Set(data.latitude),
            longitude: Set(data.longitude),
            endereco: Set(data.endereco),
            descricao: Set(data.descricao_local),
            regiao: Set(data.regiao),
        }
        .insert(&txn)
        .await?;

        let registro_id = Uuid::new_v4();
        registration::ActiveModel {
            id: Set(registro_id),
            usuario_id: Set(user_id),
            planta_id: Set(planta_id),
            localizacao_id: Set(localizacao_id),
            status: Set(StatusRegistro::Pendente),
            observacoes: Set(data.observacoes),
            motivo_rejeicao: Set(None),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        for upload in images {
            image::ActiveModel {
                id: Set(Uuid::new_v4()),
                registro_id: Set(registro_id),
                url: Set(upload.url),
                nome_arquivo: Set(upload.nome_arquivo),
                content_type: Set(upload.content_type),
                tamanho: Set(upload.tamanho),
                created_at: Set(now),
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;

        self.get_plant(planta_id).await
    }

    /// Merges only the fields present in the payload; absent fields stay as
    /// they are, explicit nulls clear the nullable columns.
    pub async fn update_plant(&self, id: Uuid, fields: PlantUpdateFields) -> Result<PlantView> {
        let existing = plant::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Planta não encontrada".to_string()))?;
        let mut active: plant::ActiveModel = existing.into();

        if let Some(nome_popular) = fields.nome_popular {
            active.nome_popular = Set(nome_popular);
        }
        if let Some(nome_cientifico) = fields.nome_cientifico {
            active.nome_cientifico = Set(nome_cientifico);
        }
        if let Some(descricao) = fields.descricao {
            active.descricao = Set(descricao);
        }
        if let Some(comestivel) = fields.comestivel {
            active.comestivel = Set(comestivel);
        }
        if let Some(medicinal) = fields.medicinal {
            active.medicinal = Set(medicinal);
        }
        if let Some(nativa) = fields.nativa {
            active.nativa = Set(nativa);
        }
        if let Some(usos) = fields.usos {
            active.usos = Set(usos);
        }
        if let Some(cuidados) = fields.cuidados {
            active.cuidados = Set(cuidados);
        }

        let updated = active.update(&self.db).await?;
        self.plant_view(updated).await
    }

    /// Hard-deletes the plant and everything hanging off it: registrations,
    /// their locations, images, comments and ratings.
    pub async fn delete_plant(&self, id: Uuid) -> Result<()> {
        plant::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Planta não encontrada".to_string()))?;

        let txn = self.db.begin().await?;

        let registros = registration::Entity::find()
            .filter(registration::Column::PlantaId.eq(id))
            .all(&txn)
            .await?;
        let registro_ids: Vec<Uuid> = registros.iter().map(|r| r.id).collect();
        let localizacao_ids: Vec<Uuid> = registros.iter().map(|r| r.localizacao_id).collect();

        comment::Entity::delete_many()
            .filter(comment::Column::RegistroId.is_in(registro_ids.clone()))
            .exec(&txn)
            .await?;
        image::Entity::delete_many()
            .filter(image::Column::RegistroId.is_in(registro_ids.clone()))
            .exec(&txn)
            .await?;
        registration::Entity::delete_many()
            .filter(registration::Column::PlantaId.eq(id))
            .exec(&txn)
            .await?;
        location::Entity::delete_many()
            .filter(location::Column::Id.is_in(localizacao_ids))
            .exec(&txn)
            .await?;
        rating::Entity::delete_many()
            .filter(rating::Column::PlantaId.eq(id))
            .exec(&txn)
            .await?;
        plant_category::Entity::delete_many()
            .filter(plant_category::Column::PlantaId.eq(id))
            .exec(&txn)
            .await?;
        plant::Entity::delete_by_id(id).exec(&txn).await?;

        txn.commit().await?;
        Ok(())
    }

    /// Upserts the caller's rating for the plant and, when a comment is given,
    /// attaches it to the most recent registration. The 1-5 range is checked
    /// at the API boundary.
    pub async fn rate_plant(
        &self,
        user_id: Uuid,
        planta_id: Uuid,
        valor: i32,
        comentario: Option<String>,
    ) -> Result<()> {
        plant::Entity::find_by_id(planta_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Planta não encontrada".to_string()))?;

        let txn = self.db.begin().await?;

        let insert = rating::Entity::insert(rating::ActiveModel {
            id: Set(Uuid::new_v4()),
            usuario_id: Set(user_id),
            planta_id: Set(planta_id),
            valor: Set(valor),
        })
        .on_conflict(
            OnConflict::columns([rating::Column::UsuarioId, rating::Column::PlantaId])
                .update_column(rating::Column::Valor)
                .to_owned(),
        )
        .exec(&txn)
        .await;
        match insert {
            Ok(_) | Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e.into()),
        }

        if let Some(texto) = comentario.filter(|t| !t.trim().is_empty()) {
            let ultimo_registro = registration::Entity::find()
                .filter(registration::Column::PlantaId.eq(planta_id))
                .order_by_desc(registration::Column::CreatedAt)
                .one(&txn)
                .await?;

            // A plant without registrations silently drops the comment rather
            // than failing the rating.
            if let Some(registro) = ultimo_registro {
                comment::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    usuario_id: Set(user_id),
                    registro_id: Set(registro.id),
                    texto: Set(texto),
                    avaliacao: Set(Some(valor)),
                    editado: Set(false),
                    created_at: Set(chrono::Utc::now().timestamp_millis()),
                }
                .insert(&txn)
                .await?;
            }
        }

        txn.commit().await?;
        Ok(())
    }

    async fn registration_locations(
        &self,
        planta_id: Uuid,
    ) -> Result<Vec<(registration::Model, location::Model)>> {
        let rows = registration::Entity::find()
            .filter(registration::Column::PlantaId.eq(planta_id))
            .order_by_desc(registration::Column::CreatedAt)
            .find_also_related(location::Entity)
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(reg, loc)| loc.map(|l| (reg, l)))
            .collect())
    }

    /// Assembles the denormalized plant projection every read path returns.
    pub async fn plant_view(&self, planta: plant::Model) -> Result<PlantView> {
        let categorias = planta
            .find_related(category::Entity)
            .all(&self.db)
            .await?;

        let registros = self.registration_locations(planta.id).await?;

        let avaliacoes = rating::Entity::find()
            .filter(rating::Column::PlantaId.eq(planta.id))
            .all(&self.db)
            .await?;
        let avaliacao_media = if avaliacoes.is_empty() {
            0.0
        } else {
            avaliacoes.iter().map(|a| a.valor as f64).sum::<f64>() / avaliacoes.len() as f64
        };

        let ultimo_registro = registros.first().map(|(reg, _)| reg.clone());

        let imagem_url = match &ultimo_registro {
            Some(registro) => image::Entity::find()
                .filter(image::Column::RegistroId.eq(registro.id))
                .order_by_asc(image::Column::CreatedAt)
                .one(&self.db)
                .await?
                .map(|img| img.url),
            None => None,
        };

        let usuario_registro = match &ultimo_registro {
            Some(registro) => user::Entity::find_by_id(registro.usuario_id)
                .one(&self.db)
                .await?
                .map(|u| UsuarioResumo {
                    id: u.id.to_string(),
                    nome: u.nome,
                }),
            None => None,
        }
        .unwrap_or_else(|| UsuarioResumo {
            id: String::new(),
            nome: "Desconhecido".to_string(),
        });

        let localizacoes = registros.iter().map(|(_, loc)| loc.clone()).collect();

        Ok(PlantView {
            id: planta.id,
            nome_popular: planta.nome_popular,
            nome_cientifico: planta.nome_cientifico,
            descricao: planta.descricao,
            comestivel: planta.comestivel,
            medicinal: planta.medicinal,
            nativa: planta.nativa,
            usos: planta.usos,
            cuidados: planta.cuidados,
            imagem_url,
            categorias,
            localizacoes,
            usuario_registro,
            data_registro: ultimo_registro
                .as_ref()
                .map(|r| r.created_at)
                .unwrap_or(planta.created_at),
            status: ultimo_registro
                .map(|r| r.status)
                .unwrap_or(StatusRegistro::Pendente),
            avaliacao_media,
            total_registros: registros.len() as u64,
            total_avaliacoes: avaliacoes.len() as u64,
        })
    }
}
