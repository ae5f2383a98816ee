//! Paginación 1-indexada con metadatos para el frontend

use serde::{Deserialize, Serialize};

pub const MAX_PER_PAGE: u32 = 100;

/// Página solicitada; siempre válida (página >= 1, tamaño en 1..=100)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl PageRequest {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    /// Valores no numéricos se ignoran y se usan los valores por defecto
    pub fn from_params(page: Option<&str>, per_page: Option<&str>, default_per_page: u32) -> Self {
        let page = page.and_then(|p| p.trim().parse::<u32>().ok()).unwrap_or(1);
        let per_page = per_page
            .and_then(|p| p.trim().parse::<u32>().ok())
            .unwrap_or(default_per_page);
        Self::new(page, per_page)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub total: i64,
    pub per_page: u32,
    pub current_page: u32,
    pub last_page: u32,
    pub from: Option<i64>,
    pub to: Option<i64>,
}

impl PageMeta {
    pub fn new(total: i64, request: &PageRequest, items_on_page: usize) -> Self {
        let per_page = i64::from(request.per_page);
        let last_page = ((total.max(0) + per_page - 1) / per_page).max(1);
        let (from, to) = if items_on_page == 0 {
            (None, None)
        } else {
            let first = request.offset() + 1;
            (Some(first), Some(first + items_on_page as i64 - 1))
        };

        Self {
            total,
            per_page: request.per_page,
            current_page: request.page,
            last_page: u32::try_from(last_page).unwrap_or(u32::MAX),
            from,
            to,
        }
    }
}

/// Cuerpo de respuesta paginado: `{ success, data, total, per_page, ... }`
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub success: bool,
    pub data: Vec<T>,
    #[serde(flatten)]
    pub meta: PageMeta,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total: i64, request: &PageRequest) -> Self {
        let meta = PageMeta::new(total, request, data.len());
        Self {
            success: true,
            data,
            meta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_is_clamped() {
        assert_eq!(PageRequest::new(0, 0), PageRequest { page: 1, per_page: 1 });
        assert_eq!(PageRequest::new(3, 500).per_page, MAX_PER_PAGE);
        assert_eq!(PageRequest::from_params(Some("x"), Some("-4"), 12), PageRequest::new(1, 12));
    }

    #[test]
    fn offset_is_zero_based() {
        let request = PageRequest::new(3, 12);
        assert_eq!(request.offset(), 24);
        assert_eq!(request.limit(), 12);
    }

    #[test]
    fn meta_for_partial_last_page() {
        let request = PageRequest::new(3, 12);
        let meta = PageMeta::new(30, &request, 6);
        assert_eq!(meta.last_page, 3);
        assert_eq!(meta.from, Some(25));
        assert_eq!(meta.to, Some(30));
    }

    #[test]
    fn meta_for_empty_result() {
        let meta = PageMeta::new(0, &PageRequest::new(1, 12), 0);
        assert_eq!(meta.last_page, 1);
        assert_eq!(meta.from, None);
        assert_eq!(meta.to, None);
    }
}
