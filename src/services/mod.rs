//! Lógica de negocio sin acceso a base de datos
//!
//! - `listing_query`: filtros, orden y SQL del listado de posts
//! - `geo`: normalización de coordenadas y distancia haversine
//! - `pricing`: desglose de precio de una reserva
//! - `pagination`: página pedida y metadatos de respuesta

pub mod geo;
pub mod listing_query;
pub mod pagination;
pub mod pricing;
