//! Estado de filtros del listado en el lado cliente
//!
//! `FilterState` es un valor inmutable: cada cambio produce un estado nuevo.
//! Si los filtros cambian la página vuelve a 1; moverse de página no toca los
//! filtros.

use rust_decimal::Decimal;

pub const DEFAULT_SORT_BY: &str = "created_at";
pub const DEFAULT_ORDER: &str = "desc";

/// Valores de filtro tal como se envían en la URL; cadena vacía = ausente
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filters {
    pub status: String,
    pub vehicle_age: String,
    pub license: String,
    pub delivery: String,
    pub search: String,
    pub min: String,
    pub max: String,
    pub popular: bool,
    pub agency_name: String,
    pub brand: String,
    pub sort_by: String,
    pub order: String,
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            status: String::new(),
            vehicle_age: String::new(),
            license: String::new(),
            delivery: String::new(),
            search: String::new(),
            min: String::new(),
            max: String::new(),
            popular: false,
            agency_name: String::new(),
            brand: String::new(),
            sort_by: DEFAULT_SORT_BY.to_string(),
            order: DEFAULT_ORDER.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    filters: Filters,
    page: u32,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            filters: Filters::default(),
            page: 1,
        }
    }
}

impl FilterState {
    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    /// Sustituye los filtros; la página se reinicia solo si algo cambió
    pub fn apply(&self, next: Filters) -> FilterState {
        let page = if next == self.filters { self.page } else { 1 };
        FilterState { filters: next, page }
    }

    /// Aplica un cambio puntual sobre una copia de los filtros actuales
    pub fn update(&self, change: impl FnOnce(&mut Filters)) -> FilterState {
        let mut next = self.filters.clone();
        change(&mut next);
        self.apply(next)
    }

    /// Pulsar el estado activo lo desactiva
    pub fn toggle_status(&self, status: &str) -> FilterState {
        self.update(|f| {
            f.status = if f.status == status { String::new() } else { status.to_string() };
        })
    }

    /// El mínimo nunca es negativo y un rango invertido se intercambia
    pub fn with_price_range(&self, min: Option<Decimal>, max: Option<Decimal>) -> FilterState {
        let mut min = min.map(|m| m.max(Decimal::ZERO));
        let mut max = max;
        if let (Some(lo), Some(hi)) = (min, max) {
            if lo > hi {
                min = Some(hi);
                max = Some(lo);
            }
        }

        self.update(|f| {
            f.min = min.map(|m| m.normalize().to_string()).unwrap_or_default();
            f.max = max.map(|m| m.normalize().to_string()).unwrap_or_default();
        })
    }

    /// Cambia de página si está dentro de `1..=last_page`; si no, nada cambia
    pub fn with_page(&self, page: u32, last_page: u32) -> FilterState {
        if page >= 1 && page <= last_page {
            FilterState {
                filters: self.filters.clone(),
                page,
            }
        } else {
            self.clone()
        }
    }

    pub fn reset(&self) -> FilterState {
        FilterState::default()
    }

    /// Pares `clave=valor` para la URL; vacíos y `false` se omiten.
    /// El filtro `status` viaja como `vehicle_status`.
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let f = &self.filters;
        let mut pairs = Vec::new();

        let text = [
            ("vehicle_status", &f.status),
            ("vehicle_age", &f.vehicle_age),
            ("license", &f.license),
            ("delivery", &f.delivery),
            ("search", &f.search),
            ("min", &f.min),
            ("max", &f.max),
            ("agency_name", &f.agency_name),
            ("brand", &f.brand),
            ("sort_by", &f.sort_by),
            ("order", &f.order),
        ];
        for (key, value) in text {
            if !value.is_empty() {
                pairs.push((key, value.clone()));
            }
        }

        if f.popular {
            pairs.push(("popular", "true".to_string()));
        }
        pairs.push(("page", self.page.to_string()));
        pairs
    }

    /// Número de filtros activos que muestra la barra lateral
    pub fn active_filter_count(&self) -> usize {
        let f = &self.filters;
        [
            !f.status.is_empty(),
            !f.vehicle_age.is_empty(),
            !f.search.is_empty(),
            !f.min.is_empty() || !f.max.is_empty(),
            !f.agency_name.is_empty(),
            !f.brand.is_empty(),
            f.popular,
        ]
        .into_iter()
        .filter(|active| *active)
        .count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageItem {
    Page(u32),
    Gap,
}

/// Ventana de paginación: primera, última y dos páginas a cada lado de la
/// actual. Un hueco de una sola página se rellena en lugar de usar `...`.
pub fn page_window(current: u32, last: u32) -> Vec<PageItem> {
    const DELTA: u32 = 2;

    let visible: Vec<u32> = (1..=last)
        .filter(|&i| i == 1 || i == last || (i + DELTA >= current && i <= current + DELTA))
        .collect();

    let mut items = Vec::with_capacity(visible.len() + 2);
    let mut previous: Option<u32> = None;
    for page in visible {
        if let Some(prev) = previous {
            if page - prev == 2 {
                items.push(PageItem::Page(prev + 1));
            } else if page - prev != 1 {
                items.push(PageItem::Gap);
            }
        }
        items.push(PageItem::Page(page));
        previous = Some(page);
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn changing_a_filter_resets_the_page() {
        let state = FilterState::default().with_page(4, 9);
        assert_eq!(state.page(), 4);

        let same = state.apply(state.filters().clone());
        assert_eq!(same.page(), 4);

        let changed = state.update(|f| f.brand = "Toyota".into());
        assert_eq!(changed.page(), 1);
        assert_eq!(changed.filters().brand, "Toyota");
    }

    #[test]
    fn out_of_range_page_is_ignored() {
        let state = FilterState::default();
        assert_eq!(state.with_page(0, 3), state);
        assert_eq!(state.with_page(4, 3), state);
        assert_eq!(state.with_page(3, 3).page(), 3);
    }

    #[test]
    fn price_range_is_clamped_and_swapped() {
        let state = FilterState::default()
            .with_price_range(Some(Decimal::from(80)), Some(Decimal::from(30)));
        assert_eq!(state.filters().min, "30");
        assert_eq!(state.filters().max, "80");

        let negative = FilterState::default().with_price_range(Some(Decimal::from(-5)), None);
        assert_eq!(negative.filters().min, "0");
        assert_eq!(negative.filters().max, "");
    }

    #[test]
    fn toggling_status_twice_clears_it() {
        let state = FilterState::default().toggle_status("available");
        assert_eq!(state.filters().status, "available");
        assert_eq!(state.toggle_status("available").filters().status, "");
    }

    #[test]
    fn query_pairs_skip_empty_values() {
        let state = FilterState::default()
            .toggle_status("rented")
            .update(|f| f.popular = true);
        let pairs = state.to_query_pairs();

        assert!(pairs.contains(&("vehicle_status", "rented".to_string())));
        assert!(pairs.contains(&("popular", "true".to_string())));
        assert!(pairs.contains(&("sort_by", "created_at".to_string())));
        assert!(pairs.contains(&("page", "1".to_string())));
        assert!(!pairs.iter().any(|(k, _)| *k == "brand" || *k == "status"));
        assert_eq!(state.active_filter_count(), 2);
    }

    #[test]
    fn page_window_uses_gaps() {
        use PageItem::*;
        assert_eq!(page_window(1, 1), vec![Page(1)]);
        assert_eq!(
            page_window(6, 12),
            vec![Page(1), Gap, Page(4), Page(5), Page(6), Page(7), Page(8), Gap, Page(12)]
        );
        // a single missing page is shown instead of a gap
        assert_eq!(
            page_window(5, 10),
            vec![Page(1), Page(2), Page(3), Page(4), Page(5), Page(6), Page(7), Gap, Page(10)]
        );
    }
}
