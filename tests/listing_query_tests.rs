use rust_decimal::Decimal;
use vehicle_rental::models::{DeliveryOption, PostStatus, VehicleStatus};
use vehicle_rental::services::listing_query::{
    ListingDefaults, ListingFilter, ListingParams, ListingQuery, ListingRecord, PriceRange,
    VehicleAge, YearBound,
};

const YEAR: i32 = 2026;

fn record(brand: &str, price: i64, year: i32) -> ListingRecord {
    ListingRecord {
        status: PostStatus::Published,
        title: format!("{} for rent", brand),
        description: "Clean and ready".to_string(),
        view_count: 50,
        min_license_years: 2,
        min_driver_age: 21,
        delivery_options: vec![DeliveryOption::AgencyPickup],
        average_rating: Decimal::ZERO,
        total_reviews: 0,
        agency_name: "Atlas Cars".to_string(),
        vehicle_brand: brand.to_string(),
        vehicle_model: "Base".to_string(),
        vehicle_year: year,
        vehicle_status: VehicleStatus::Available,
        price_per_day: Decimal::from(price),
    }
}

fn catalogue() -> Vec<ListingRecord> {
    let mut records = vec![
        record("Toyota", 25, 2024),
        record("Toyota", 30, 2019),
        record("Toyota", 45, 2022),
        record("Toyota", 60, 2025),
        record("Toyota", 61, 2018),
        record("Dacia", 35, 2023),
        record("Renault", 50, 2015),
    ];

    let mut draft = record("Toyota", 40, 2024);
    draft.status = PostStatus::Draft;
    records.push(draft);

    let mut popular = record("Peugeot", 55, 2021);
    popular.view_count = 500;
    popular.delivery_options = vec![DeliveryOption::AgencyPickup, DeliveryOption::Delivery];
    popular.average_rating = Decimal::new(45, 1);
    popular.total_reviews = 8;
    records.push(popular);

    let mut strict = record("Toyota Hilux", 48, 2020);
    strict.min_license_years = 5;
    strict.vehicle_status = VehicleStatus::Rented;
    strict.agency_name = "Sahara Rent".to_string();
    records.push(strict);

    records
}

fn sample_filters() -> Vec<ListingFilter> {
    vec![
        ListingFilter::MinViews(100),
        ListingFilter::AgencyNameContains("atlas".into()),
        ListingFilter::BrandContains("toyota".into()),
        ListingFilter::VehicleStatusIs(VehicleStatus::Available),
        ListingFilter::VehicleYear(VehicleAge::Classic.year_bound(YEAR)),
        ListingFilter::LicenseYearsAtMost(3),
        ListingFilter::OffersDelivery(DeliveryOption::Delivery),
        ListingFilter::Search("hilux".into()),
        ListingFilter::PriceBetween(PriceRange::new(Decimal::from(30), Decimal::from(60))),
        ListingFilter::MinRating(Decimal::from(4)),
    ]
}

fn matching(records: &[ListingRecord], filters: &[ListingFilter]) -> Vec<usize> {
    records
        .iter()
        .enumerate()
        .filter(|(_, r)| filters.iter().all(|f| f.matches(r)))
        .map(|(i, _)| i)
        .collect()
}

#[test]
fn combined_filters_equal_the_intersection_of_single_filters() {
    let records = catalogue();
    let filters = sample_filters();

    // every subset of the sample filters
    for mask in 0u32..(1 << filters.len()) {
        let chosen: Vec<ListingFilter> = filters
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, f)| f.clone())
            .collect();

        let together = matching(&records, &chosen);
        let intersected: Vec<usize> = (0..records.len())
            .filter(|i| {
                chosen
                    .iter()
                    .all(|f| matching(&records, std::slice::from_ref(f)).contains(i))
            })
            .collect();

        assert_eq!(together, intersected, "mask {:b}", mask);
    }
}

#[test]
fn classic_bucket_is_strictly_older_than_five_years() {
    let bound = VehicleAge::Classic.year_bound(YEAR);
    assert_eq!(bound, YearBound::Before(YEAR - 5));

    for year in 1990..=YEAR {
        let included = ListingFilter::VehicleYear(bound).matches(&record("Any", 40, year));
        assert_eq!(included, year < YEAR - 5, "year {}", year);
    }
}

#[test]
fn toyota_between_thirty_and_sixty_returns_only_published_matches() {
    let params = ListingParams {
        brand: Some("Toyota".into()),
        min: Some("30".into()),
        max: Some("60".into()),
        ..Default::default()
    };
    let query = ListingQuery::published(&params, &ListingDefaults::default(), YEAR);

    let found: Vec<ListingRecord> = catalogue().into_iter().filter(|r| query.matches(r)).collect();

    assert_eq!(found.len(), 4);
    for listing in &found {
        assert_eq!(listing.status, PostStatus::Published);
        assert!(listing.vehicle_brand.to_lowercase().contains("toyota"));
        assert!(listing.price_per_day >= Decimal::from(30));
        assert!(listing.price_per_day <= Decimal::from(60));
    }
}

#[test]
fn only_one_price_bound_is_ignored() {
    let params = ListingParams {
        min: Some("30".into()),
        ..Default::default()
    };
    let query = ListingQuery::published(&params, &ListingDefaults::default(), YEAR);
    assert_eq!(query.filters, vec![ListingFilter::Published]);
}

#[test]
fn count_query_has_no_ordering_or_paging() {
    let params = ListingParams {
        brand: Some("Toyota".into()),
        sort_by: Some("price".into()),
        ..Default::default()
    };
    let query = ListingQuery::published(&params, &ListingDefaults::default(), YEAR);
    let count = query.count_query();
    let sql = count.sql();

    assert!(sql.starts_with("SELECT COUNT(*) FROM posts WHERE posts.status = $1"));
    assert!(sql.contains("v.brand ILIKE $2"));
    assert!(!sql.contains("ORDER BY"));
    assert!(!sql.contains("LIMIT"));
}

#[test]
fn select_query_sorts_by_vehicle_price_without_joins() {
    let params = ListingParams {
        sort_by: Some("price".into()),
        order: Some("asc".into()),
        page: Some("3".into()),
        per_page: Some("10".into()),
        ..Default::default()
    };
    let query = ListingQuery::published(&params, &ListingDefaults::default(), YEAR);
    let select = query.select_query();
    let sql = select.sql();

    assert!(!sql.contains("JOIN"));
    assert!(sql.contains(
        "ORDER BY (SELECT v.price_per_day FROM vehicles v WHERE v.id = posts.vehicle_id LIMIT 1) ASC, posts.id ASC"
    ));
    assert!(sql.ends_with("LIMIT $2 OFFSET $3"));
    assert_eq!(query.page.offset(), 20);
}

#[test]
fn unknown_sort_key_uses_created_at_desc() {
    let params = ListingParams {
        sort_by: Some("horsepower".into()),
        ..Default::default()
    };
    let query = ListingQuery::published(&params, &ListingDefaults::default(), YEAR);
    let select = query.select_query();

    assert!(select.sql().contains("ORDER BY posts.created_at DESC, posts.id DESC"));
}

#[test]
fn per_page_is_clamped() {
    let params = ListingParams {
        per_page: Some("1000".into()),
        page: Some("0".into()),
        ..Default::default()
    };
    let query = ListingQuery::published(&params, &ListingDefaults::default(), YEAR);
    assert_eq!(query.page.per_page, 100);
    assert_eq!(query.page.page, 1);
}

#[test]
fn malformed_values_are_treated_as_absent() {
    let params = ListingParams {
        license: Some("two".into()),
        vehicle_status: Some("sold".into()),
        vehicle_age: Some("ancient".into()),
        popular: Some("maybe".into()),
        agency_name: Some("".into()),
        ..Default::default()
    };
    let query = ListingQuery::published(&params, &ListingDefaults::default(), YEAR);
    assert_eq!(query.filters, vec![ListingFilter::Published]);
}

#[test]
fn delivery_filter_casts_the_json_column() {
    let params = ListingParams {
        delivery: Some("delivery".into()),
        ..Default::default()
    };
    let query = ListingQuery::published(&params, &ListingDefaults::default(), YEAR);
    let count = query.count_query();

    assert!(count
        .sql()
        .ends_with("posts.status = $1 AND posts.delivery_options::jsonb @> $2"));
}
