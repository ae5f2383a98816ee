//! Constructor de consultas del listado de posts
//!
//! Los parámetros de la URL se convierten primero en un struct tipado
//! (`ListingFilters`); un valor con tipo inesperado se trata como ausente.
//! Los filtros presentes se convierten en una lista de predicados
//! (`ListingFilter`) que se combinan con AND. Cada predicado sabe escribirse
//! en SQL y evaluarse en memoria sobre un `ListingRecord`.
//!
//! Los datos del vehículo y de la agencia se consultan con sub-consultas
//! `EXISTS` / correlacionadas, nunca con JOIN, para no duplicar filas.

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::types::Json;
use sqlx::{Postgres, QueryBuilder};

use crate::models::{DeliveryOption, PostStatus, VehicleStatus};
use crate::services::pagination::PageRequest;

/// Parámetros crudos de `GET /api/posts`. Todo llega como texto para que un
/// valor mal formado nunca rechace la petición.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingParams {
    pub popular: Option<String>,
    pub agency_name: Option<String>,
    pub brand: Option<String>,
    pub vehicle_status: Option<String>,
    pub vehicle_age: Option<String>,
    pub license: Option<String>,
    pub min_driver_age: Option<String>,
    pub delivery: Option<String>,
    pub search: Option<String>,
    pub min: Option<String>,
    pub max: Option<String>,
    pub min_rating: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub page: Option<String>,
    pub per_page: Option<String>,
}

/// Valores por defecto que vienen de la configuración
#[derive(Debug, Clone, Copy)]
pub struct ListingDefaults {
    pub per_page: u32,
    pub popular_min_views: i32,
}

impl Default for ListingDefaults {
    fn default() -> Self {
        Self {
            per_page: 12,
            popular_min_views: 100,
        }
    }
}

/// Tramo de antigüedad del vehículo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VehicleAge {
    /// `1`: año >= actual - 1
    New,
    /// `3`: entre actual - 3 y actual - 1
    Young,
    /// `5`: entre actual - 5 y actual - 3
    Mature,
    /// `5+`: año < actual - 5
    Classic,
    /// Cualquier otro entero: año exactamente igual a actual - edad
    Exact(i32),
}

impl VehicleAge {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "1" => Some(VehicleAge::New),
            "3" => Some(VehicleAge::Young),
            "5" => Some(VehicleAge::Mature),
            "5+" => Some(VehicleAge::Classic),
            other => other
                .parse::<i32>()
                .ok()
                .filter(|age| *age >= 0)
                .map(VehicleAge::Exact),
        }
    }

    pub fn year_bound(&self, current_year: i32) -> YearBound {
        match *self {
            VehicleAge::New => YearBound::AtLeast(current_year - 1),
            VehicleAge::Young => YearBound::Between(current_year - 3, current_year - 1),
            VehicleAge::Mature => YearBound::Between(current_year - 5, current_year - 3),
            VehicleAge::Classic => YearBound::Before(current_year - 5),
            VehicleAge::Exact(age) => YearBound::Exactly(current_year - age),
        }
    }
}

/// Restricción sobre el año del vehículo ya resuelta contra el año actual
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YearBound {
    AtLeast(i32),
    Between(i32, i32),
    Before(i32),
    Exactly(i32),
}

impl YearBound {
    pub fn contains(&self, year: i32) -> bool {
        match *self {
            YearBound::AtLeast(min) => year >= min,
            YearBound::Between(min, max) => (min..=max).contains(&year),
            YearBound::Before(limit) => year < limit,
            YearBound::Exactly(exact) => year == exact,
        }
    }

    fn push_sql(&self, qb: &mut QueryBuilder<'static, Postgres>) {
        match *self {
            YearBound::AtLeast(min) => {
                qb.push("v.year >= ").push_bind(min);
            }
            YearBound::Between(min, max) => {
                qb.push("v.year BETWEEN ").push_bind(min).push(" AND ").push_bind(max);
            }
            YearBound::Before(limit) => {
                qb.push("v.year < ").push_bind(limit);
            }
            YearBound::Exactly(exact) => {
                qb.push("v.year = ").push_bind(exact);
            }
        }
    }
}

/// Rango de precio por día, inclusivo en ambos extremos
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceRange {
    pub min: Decimal,
    pub max: Decimal,
}

impl PriceRange {
    /// Los extremos invertidos se intercambian
    pub fn new(a: Decimal, b: Decimal) -> Self {
        if a <= b {
            Self { min: a, max: b }
        } else {
            Self { min: b, max: a }
        }
    }

    pub fn contains(&self, price: Decimal) -> bool {
        price >= self.min && price <= self.max
    }
}

/// Filtros opcionales ya tipados
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingFilters {
    pub popular: Option<i32>,
    pub agency_name: Option<String>,
    pub brand: Option<String>,
    pub vehicle_status: Option<VehicleStatus>,
    pub vehicle_age: Option<VehicleAge>,
    pub license_years: Option<i32>,
    pub min_driver_age: Option<i32>,
    pub delivery: Option<DeliveryOption>,
    pub search: Option<String>,
    pub price: Option<PriceRange>,
    pub min_rating: Option<Decimal>,
}

impl ListingFilters {
    pub fn from_params(params: &ListingParams, defaults: &ListingDefaults) -> Self {
        let price = match (decimal(&params.min), decimal(&params.max)) {
            (Some(min), Some(max)) => Some(PriceRange::new(min, max)),
            _ => None,
        };

        Self {
            popular: given(&params.popular).and_then(|raw| popular_threshold(&raw, defaults)),
            agency_name: given(&params.agency_name),
            brand: given(&params.brand),
            vehicle_status: given(&params.vehicle_status).and_then(|s| s.parse().ok()),
            vehicle_age: given(&params.vehicle_age).and_then(|s| VehicleAge::parse(&s)),
            license_years: given(&params.license).and_then(|s| s.parse().ok()),
            min_driver_age: given(&params.min_driver_age).and_then(|s| s.parse().ok()),
            delivery: given(&params.delivery).and_then(|s| s.parse().ok()),
            search: given(&params.search),
            price,
            min_rating: given(&params.min_rating).and_then(|s| s.parse().ok()),
        }
    }

    /// Lista de predicados en orden estable. No incluye la restricción de
    /// publicación; eso lo decide quien construye la consulta.
    pub fn predicates(&self, current_year: i32) -> Vec<ListingFilter> {
        let mut out = Vec::new();
        if let Some(status) = self.vehicle_status {
            out.push(ListingFilter::VehicleStatusIs(status));
        }
        if let Some(min_views) = self.popular {
            out.push(ListingFilter::MinViews(min_views));
        }
        if let Some(name) = &self.agency_name {
            out.push(ListingFilter::AgencyNameContains(name.clone()));
        }
        if let Some(brand) = &self.brand {
            out.push(ListingFilter::BrandContains(brand.clone()));
        }
        if let Some(age) = self.vehicle_age {
            out.push(ListingFilter::VehicleYear(age.year_bound(current_year)));
        }
        if let Some(years) = self.license_years {
            out.push(ListingFilter::LicenseYearsAtMost(years));
        }
        if let Some(age) = self.min_driver_age {
            out.push(ListingFilter::DriverAgeAtMost(age));
        }
        if let Some(option) = self.delivery {
            out.push(ListingFilter::OffersDelivery(option));
        }
        if let Some(keyword) = &self.search {
            out.push(ListingFilter::Search(keyword.clone()));
        }
        if let Some(rating) = self.min_rating {
            out.push(ListingFilter::MinRating(rating));
        }
        if let Some(range) = self.price {
            out.push(ListingFilter::PriceBetween(range));
        }
        out
    }
}

fn text(raw: &Option<String>) -> Option<String> {
    raw.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Como `text`, pero un `"0"` literal tampoco activa el filtro. El rango de
/// precio no pasa por aquí: `min=0` es un límite válido.
fn given(raw: &Option<String>) -> Option<String> {
    text(raw).filter(|s| s != "0")
}

fn decimal(raw: &Option<String>) -> Option<Decimal> {
    text(raw).and_then(|s| s.parse().ok())
}

fn popular_threshold(raw: &str, defaults: &ListingDefaults) -> Option<i32> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "on" | "yes" => Some(defaults.popular_min_views),
        other => other.parse::<i32>().ok().filter(|n| *n >= 0),
    }
}

/// Vista mínima de un post con su vehículo y agencia, suficiente para
/// evaluar los predicados fuera de la base de datos.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingRecord {
    pub status: PostStatus,
    pub title: String,
    pub description: String,
    pub view_count: i32,
    pub min_license_years: i32,
    pub min_driver_age: i32,
    pub delivery_options: Vec<DeliveryOption>,
    pub average_rating: Decimal,
    pub total_reviews: i32,
    pub agency_name: String,
    pub vehicle_brand: String,
    pub vehicle_model: String,
    pub vehicle_year: i32,
    pub vehicle_status: VehicleStatus,
    pub price_per_day: Decimal,
}

/// Predicado individual sobre posts
#[derive(Debug, Clone, PartialEq)]
pub enum ListingFilter {
    Published,
    MinViews(i32),
    AgencyNameContains(String),
    BrandContains(String),
    VehicleStatusIs(VehicleStatus),
    VehicleYear(YearBound),
    LicenseYearsAtMost(i32),
    DriverAgeAtMost(i32),
    OffersDelivery(DeliveryOption),
    Search(String),
    PriceBetween(PriceRange),
    MinRating(Decimal),
}

impl ListingFilter {
    pub fn matches(&self, record: &ListingRecord) -> bool {
        match self {
            ListingFilter::Published => record.status == PostStatus::Published,
            ListingFilter::MinViews(min) => record.view_count >= *min,
            ListingFilter::AgencyNameContains(name) => contains_ci(&record.agency_name, name),
            ListingFilter::BrandContains(brand) => contains_ci(&record.vehicle_brand, brand),
            ListingFilter::VehicleStatusIs(status) => record.vehicle_status == *status,
            ListingFilter::VehicleYear(bound) => bound.contains(record.vehicle_year),
            ListingFilter::LicenseYearsAtMost(years) => record.min_license_years <= *years,
            ListingFilter::DriverAgeAtMost(age) => record.min_driver_age <= *age,
            ListingFilter::OffersDelivery(option) => record.delivery_options.contains(option),
            ListingFilter::Search(keyword) => {
                contains_ci(&record.title, keyword)
                    || contains_ci(&record.description, keyword)
                    || contains_ci(&record.vehicle_brand, keyword)
                    || contains_ci(&record.vehicle_model, keyword)
            }
            ListingFilter::PriceBetween(range) => range.contains(record.price_per_day),
            ListingFilter::MinRating(min) => {
                record.average_rating >= *min && record.total_reviews > 0
            }
        }
    }

    /// Escribe el predicado como una expresión booleana autocontenida
    pub fn push_sql(&self, qb: &mut QueryBuilder<'static, Postgres>) {
        match self {
            ListingFilter::Published => {
                qb.push("posts.status = ").push_bind(PostStatus::Published);
            }
            ListingFilter::MinViews(min) => {
                qb.push("posts.view_count >= ").push_bind(*min);
            }
            ListingFilter::AgencyNameContains(name) => {
                qb.push("EXISTS (SELECT 1 FROM agencies a WHERE a.id = posts.agency_id AND a.name ILIKE ")
                    .push_bind(like_pattern(name))
                    .push(")");
            }
            ListingFilter::BrandContains(brand) => {
                push_vehicle_exists(qb);
                qb.push("v.brand ILIKE ").push_bind(like_pattern(brand)).push(")");
            }
            ListingFilter::VehicleStatusIs(status) => {
                push_vehicle_exists(qb);
                qb.push("v.status = ").push_bind(*status).push(")");
            }
            ListingFilter::VehicleYear(bound) => {
                push_vehicle_exists(qb);
                bound.push_sql(qb);
                qb.push(")");
            }
            ListingFilter::LicenseYearsAtMost(years) => {
                qb.push("posts.min_license_years <= ").push_bind(*years);
            }
            ListingFilter::DriverAgeAtMost(age) => {
                qb.push("posts.min_driver_age <= ").push_bind(*age);
            }
            ListingFilter::OffersDelivery(option) => {
                qb.push("posts.delivery_options::jsonb @> ").push_bind(Json(vec![*option]));
            }
            ListingFilter::Search(keyword) => {
                let pattern = like_pattern(keyword);
                qb.push("(posts.title ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR posts.description ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR EXISTS (SELECT 1 FROM vehicles v WHERE v.id = posts.vehicle_id AND (v.brand ILIKE ")
                    .push_bind(pattern.clone())
                    .push(" OR v.model ILIKE ")
                    .push_bind(pattern)
                    .push(")))");
            }
            ListingFilter::PriceBetween(range) => {
                push_vehicle_exists(qb);
                qb.push("v.price_per_day BETWEEN ")
                    .push_bind(range.min)
                    .push(" AND ")
                    .push_bind(range.max)
                    .push(")");
            }
            ListingFilter::MinRating(min) => {
                qb.push("(posts.average_rating >= ")
                    .push_bind(*min)
                    .push(" AND posts.total_reviews > 0)");
            }
        }
    }
}

fn push_vehicle_exists(qb: &mut QueryBuilder<'static, Postgres>) {
    qb.push("EXISTS (SELECT 1 FROM vehicles v WHERE v.id = posts.vehicle_id AND ");
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Patrón `%valor%` con los comodines de LIKE escapados
pub fn like_pattern(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len() + 2);
    escaped.push('%');
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Clave de ordenación
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    CreatedAt,
    Rating,
    Popularity,
    Price,
    Year,
    Mileage,
}

impl SortKey {
    /// Las claves desconocidas vuelven a `created_at`
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("rating") | Some("average_rating") => SortKey::Rating,
            Some("popularity") | Some("view_count") => SortKey::Popularity,
            Some("price") | Some("price_per_day") => SortKey::Price,
            Some("year") => SortKey::Year,
            Some("mileage") => SortKey::Mileage,
            _ => SortKey::CreatedAt,
        }
    }

    /// Expresión SQL de ordenación. Las columnas del vehículo se resuelven con
    /// una sub-consulta correlacionada de un solo valor por fila.
    pub fn order_expr(&self) -> &'static str {
        match self {
            SortKey::CreatedAt => "posts.created_at",
            SortKey::Rating => "posts.average_rating",
            SortKey::Popularity => "posts.view_count",
            SortKey::Price => {
                "(SELECT v.price_per_day FROM vehicles v WHERE v.id = posts.vehicle_id LIMIT 1)"
            }
            SortKey::Year => "(SELECT v.year FROM vehicles v WHERE v.id = posts.vehicle_id LIMIT 1)",
            SortKey::Mileage => {
                "(SELECT v.mileage FROM vehicles v WHERE v.id = posts.vehicle_id LIMIT 1)"
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("asc") => SortDirection::Asc,
            _ => SortDirection::Desc,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sort {
    pub key: SortKey,
    pub direction: SortDirection,
}

/// Consulta completa: predicados, orden y página
#[derive(Debug, Clone, PartialEq)]
pub struct ListingQuery {
    pub filters: Vec<ListingFilter>,
    pub sort: Sort,
    pub page: PageRequest,
}

impl ListingQuery {
    /// Consulta pública: solo posts publicados más los filtros recibidos
    pub fn published(params: &ListingParams, defaults: &ListingDefaults, current_year: i32) -> Self {
        let mut filters = vec![ListingFilter::Published];
        filters.extend(ListingFilters::from_params(params, defaults).predicates(current_year));

        Self {
            filters,
            sort: Sort {
                key: SortKey::parse(params.sort_by.as_deref()),
                direction: SortDirection::parse(params.order.as_deref()),
            },
            page: PageRequest::from_params(
                params.page.as_deref(),
                params.per_page.as_deref(),
                defaults.per_page,
            ),
        }
    }

    pub fn matches(&self, record: &ListingRecord) -> bool {
        self.filters.iter().all(|f| f.matches(record))
    }

    fn push_where(&self, qb: &mut QueryBuilder<'static, Postgres>) {
        for (i, filter) in self.filters.iter().enumerate() {
            qb.push(if i == 0 { " WHERE " } else { " AND " });
            filter.push_sql(qb);
        }
    }

    pub fn count_query(&self) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new("SELECT COUNT(*) FROM posts");
        self.push_where(&mut qb);
        qb
    }

    pub fn select_query(&self) -> QueryBuilder<'static, Postgres> {
        let mut qb = QueryBuilder::new("SELECT posts.* FROM posts");
        self.push_where(&mut qb);

        let direction = self.sort.direction.as_sql();
        qb.push(" ORDER BY ")
            .push(self.sort.key.order_expr())
            .push(" ")
            .push(direction)
            .push(", posts.id ")
            .push(direction);

        qb.push(" LIMIT ")
            .push_bind(self.page.limit())
            .push(" OFFSET ")
            .push_bind(self.page.offset());
        qb
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ListingParams {
        ListingParams::default()
    }

    #[test]
    fn empty_and_blank_values_are_absent() {
        let mut p = params();
        p.brand = Some("   ".into());
        p.license = Some("abc".into());
        p.vehicle_status = Some("flying".into());
        p.delivery = Some("teleport".into());
        p.min = Some("10".into());
        let filters = ListingFilters::from_params(&p, &ListingDefaults::default());
        assert_eq!(filters, ListingFilters::default());
    }

    #[test]
    fn popular_accepts_flag_or_threshold() {
        let defaults = ListingDefaults::default();
        assert_eq!(popular_threshold("true", &defaults), Some(100));
        assert_eq!(popular_threshold("250", &defaults), Some(250));
        assert_eq!(popular_threshold("false", &defaults), None);
    }

    #[test]
    fn price_range_is_reordered() {
        let mut p = params();
        p.min = Some("60".into());
        p.max = Some("30".into());
        let filters = ListingFilters::from_params(&p, &ListingDefaults::default());
        assert_eq!(
            filters.price,
            Some(PriceRange {
                min: Decimal::from(30),
                max: Decimal::from(60)
            })
        );
    }

    #[test]
    fn vehicle_age_buckets() {
        let year = 2026;
        assert_eq!(VehicleAge::parse("1").unwrap().year_bound(year), YearBound::AtLeast(2025));
        assert_eq!(VehicleAge::parse("3").unwrap().year_bound(year), YearBound::Between(2023, 2025));
        assert_eq!(VehicleAge::parse("5").unwrap().year_bound(year), YearBound::Between(2021, 2023));
        assert_eq!(VehicleAge::parse("5+").unwrap().year_bound(year), YearBound::Before(2021));
        assert_eq!(VehicleAge::parse("8").unwrap().year_bound(year), YearBound::Exactly(2018));
        assert_eq!(VehicleAge::parse("old"), None);
        assert_eq!(VehicleAge::parse("-2"), None);
    }

    #[test]
    fn literal_zero_imposes_no_constraint() {
        let mut p = params();
        p.vehicle_age = Some("0".into());
        p.license = Some("0".into());
        p.popular = Some("0".into());
        p.min_rating = Some("0".into());
        let filters = ListingFilters::from_params(&p, &ListingDefaults::default());
        assert_eq!(filters, ListingFilters::default());

        p.min = Some("0".into());
        p.max = Some("40".into());
        let filters = ListingFilters::from_params(&p, &ListingDefaults::default());
        assert_eq!(filters.price, Some(PriceRange::new(Decimal::ZERO, Decimal::from(40))));
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn sort_parsing_falls_back_to_created_at() {
        assert_eq!(SortKey::parse(Some("price")), SortKey::Price);
        assert_eq!(SortKey::parse(Some("rating")), SortKey::Rating);
        assert_eq!(SortKey::parse(Some("id; DROP TABLE posts")), SortKey::CreatedAt);
        assert_eq!(SortKey::parse(None), SortKey::CreatedAt);
        assert_eq!(SortDirection::parse(Some("ASC")), SortDirection::Asc);
        assert_eq!(SortDirection::parse(Some("sideways")), SortDirection::Desc);
    }
}
