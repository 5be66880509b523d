//! Live integration tests for flowershop-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/flowershop-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory.

use chrono::{Datelike, NaiveDate};
use flowershop_core::cart::{checkout, PlacedOrder};
use flowershop_core::{load_catalog, Cart, ReviewDraft};
use flowershop_db::{
    add_product_image, category_with_children_ids, create_bot_product, create_category,
    create_discount, create_hero_banner, create_order, create_public_review, current_hero_banner,
    delete_category, delete_discount, delete_order, delete_product_image, get_cart_session,
    get_category, get_discount_by_code, get_order, get_product, list_all_product_images,
    list_category_cards, list_discounts, list_homepage_showcase, list_missing_slugs,
    list_order_items, list_orders, list_products, list_products_in_categories, list_reviews,
    list_store_showcase, list_taken_slugs, load_cart, load_product_relations, manager_can_post_to,
    pin_showcase_item, purge_idle_carts, reorder_showcase, save_cart, save_checkout, seed_catalog,
    set_product_price, set_product_published, set_slug, unpin_showcase_item, update_category,
    update_discount, update_product, update_review, BotProductInput, DbError, HeroBannerInput,
    ProductFilter, ProductPatch, ReviewPatch, ShowcaseOrder, SlugTarget,
};
use rust_decimal::Decimal;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Insert a product row and return its generated `id`.
async fn insert_test_product(
    pool: &sqlx::PgPool,
    title: &str,
    category_id: Option<i64>,
    is_published: bool,
    is_online_showcase: bool,
    showcase_sort_order: i32,
) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO products \
             (title, category_id, is_published, is_online_showcase, showcase_sort_order, price, image) \
         VALUES ($1, $2, $3, $4, $5, 50, $6) RETURNING id",
    )
    .bind(title)
    .bind(category_id)
    .bind(is_published)
    .bind(is_online_showcase)
    .bind(showcase_sort_order)
    .bind(format!("https://old.example/img/{title}.jpg"))
    .fetch_one(pool)
    .await
    .unwrap_or_else(|e| panic!("insert_test_product failed for '{title}': {e}"))
}

async fn insert_test_store(pool: &sqlx::PgPool, subdomain: &str, is_active: bool) -> i64 {
    sqlx::query_scalar::<_, i64>(
        "INSERT INTO stores (subdomain, name, is_active) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(subdomain)
    .bind(format!("Store {subdomain}"))
    .bind(is_active)
    .fetch_one(pool)
    .await
    .unwrap_or_else(|e| panic!("insert_test_store failed for '{subdomain}': {e}"))
}

async fn insert_test_manager(pool: &sqlx::PgPool, telegram_id: i64, store_ids: &[i64]) -> i64 {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO store_managers (telegram_id, full_name) VALUES ($1, 'Test') RETURNING id",
    )
    .bind(telegram_id)
    .fetch_one(pool)
    .await
    .expect("insert manager");
    for store_id in store_ids {
        sqlx::query("INSERT INTO store_manager_stores (manager_id, store_id) VALUES ($1, $2)")
            .bind(id)
            .bind(store_id)
            .execute(pool)
            .await
            .expect("link manager store");
    }
    id
}

async fn tag_product(pool: &sqlx::PgPool, product_id: i64, tag_name: &str) -> i64 {
    let tag_id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO flower_tags (name, slug) VALUES ($1, $2) \
         ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name RETURNING id",
    )
    .bind(tag_name)
    .bind(flowershop_core::slugify(tag_name))
    .fetch_one(pool)
    .await
    .expect("insert flower tag");
    sqlx::query("INSERT INTO product_flower_tags (product_id, flower_tag_id) VALUES ($1, $2)")
        .bind(product_id)
        .bind(tag_id)
        .execute(pool)
        .await
        .expect("tag product");
    tag_id
}

fn banner(name: &str, sort_order: i32) -> HeroBannerInput {
    HeroBannerInput {
        name: name.to_string(),
        title: String::new(),
        caption: String::new(),
        overview: String::new(),
        button_text: "Перейти в каталог".to_string(),
        button_url: "/store".to_string(),
        desktop_image: format!("hero/{name}.jpg"),
        mobile_image: None,
        is_active: true,
        starts_on: None,
        ends_on: None,
        sort_order,
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

// ---------------------------------------------------------------------------
// Section 1: Seeding
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn seed_bundled_catalog_is_idempotent(pool: sqlx::PgPool) {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/catalog.yaml");
    let catalog = load_catalog(&path).expect("bundled catalog loads");

    let first = seed_catalog(&pool, &catalog).await.expect("first seed");
    let second = seed_catalog(&pool, &catalog).await.expect("second seed");
    assert_eq!(first, second);

    let categories: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM categories")
        .fetch_one(&pool)
        .await
        .expect("count categories");
    assert_eq!(usize::try_from(categories).unwrap(), first.categories);

    let banners: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM hero_banners")
        .fetch_one(&pool)
        .await
        .expect("count banners");
    assert_eq!(usize::try_from(banners).unwrap(), first.hero_banners);
}

// ---------------------------------------------------------------------------
// Section 2: Products
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn list_products_hides_unpublished_from_public(pool: sqlx::PgPool) {
    insert_test_product(&pool, "visible", None, true, false, 0).await;
    insert_test_product(&pool, "hidden", None, false, false, 0).await;

    let public = list_products(
        &pool,
        ProductFilter {
            limit: 50,
            ..ProductFilter::default()
        },
    )
    .await
    .expect("list public");
    assert_eq!(public.len(), 1);
    assert_eq!(public[0].title, "visible");

    let staff = list_products(
        &pool,
        ProductFilter {
            include_unpublished: true,
            limit: 50,
            ..ProductFilter::default()
        },
    )
    .await
    .expect("list staff");
    assert_eq!(staff.len(), 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn list_products_filters_by_store_tag_and_category(pool: sqlx::PgPool) {
    let roses = create_category(&pool, "Розы", "rozy", None, 0)
        .await
        .expect("category");
    let a = insert_test_product(&pool, "a", Some(roses.id), true, false, 0).await;
    let b = insert_test_product(&pool, "b", None, true, false, 0).await;
    let store = insert_test_store(&pool, "gomel", true).await;
    sqlx::query("INSERT INTO product_stores (product_id, store_id) VALUES ($1, $2)")
        .bind(b)
        .bind(store)
        .execute(&pool)
        .await
        .expect("link store");
    tag_product(&pool, a, "Пион").await;

    let by_category = list_products(
        &pool,
        ProductFilter {
            category: Some("Розы"),
            limit: 50,
            ..ProductFilter::default()
        },
    )
    .await
    .expect("by category");
    assert_eq!(by_category.iter().map(|p| p.id).collect::<Vec<_>>(), vec![a]);
    assert_eq!(by_category[0].category_name.as_deref(), Some("Розы"));

    let by_store = list_products(
        &pool,
        ProductFilter {
            store_subdomain: Some("gomel"),
            limit: 50,
            ..ProductFilter::default()
        },
    )
    .await
    .expect("by store");
    assert_eq!(by_store.iter().map(|p| p.id).collect::<Vec<_>>(), vec![b]);

    let by_tag = list_products(
        &pool,
        ProductFilter {
            flower_tag: Some("Пион"),
            limit: 50,
            ..ProductFilter::default()
        },
    )
    .await
    .expect("by tag");
    assert_eq!(by_tag.iter().map(|p| p.id).collect::<Vec<_>>(), vec![a]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn update_product_replaces_relation_sets(pool: sqlx::PgPool) {
    let id = insert_test_product(&pool, "p", None, true, false, 0).await;
    let store = insert_test_store(&pool, "minsk", true).await;
    let extra = create_category(&pool, "Подарки", "podarki", None, 0)
        .await
        .expect("category");

    let patch = ProductPatch {
        title: Some("Новый".to_string()),
        price: Some(None),
        store_ids: Some(vec![store]),
        category_ids: Some(vec![extra.id]),
        ..ProductPatch::default()
    };
    let row = update_product(&pool, id, &patch).await.expect("update");
    assert_eq!(row.title, "Новый");
    assert!(row.price.is_none());

    let relations = load_product_relations(&pool, id).await.expect("relations");
    assert_eq!(relations.stores.len(), 1);
    assert_eq!(relations.categories[0].name, "Подарки");
}

#[sqlx::test(migrations = "../../migrations")]
async fn update_missing_product_is_not_found(pool: sqlx::PgPool) {
    let err = update_product(&pool, 9999, &ProductPatch::default())
        .await
        .unwrap_err();
    assert!(matches!(err, flowershop_db::DbError::NotFound));
}

#[sqlx::test(migrations = "../../migrations")]
async fn bot_product_links_store_showcase_and_article(pool: sqlx::PgPool) {
    let store = insert_test_store(&pool, "", true).await;
    let manager = insert_test_manager(&pool, 555, &[store]).await;

    let row = create_bot_product(
        &pool,
        &BotProductInput {
            title: "Букет".to_string(),
            description: String::new(),
            price: Decimal::new(4550, 2),
            slug: "buket".to_string(),
            uploaded_image: "product_uploads/ab/abc.jpg".to_string(),
            image: "https://flowers.example/media/product_uploads/ab/abc.jpg".to_string(),
            manager_id: manager,
            store_id: store,
            store_subdomain: String::new(),
        },
    )
    .await
    .expect("create bot product");

    assert!(row.is_published);
    assert!(row.is_online_showcase);
    assert_eq!(row.created_by, Some(manager));
    assert_eq!(row.article, format!("main-{}", row.id));

    let showcase = list_store_showcase(&pool, store).await.expect("store showcase");
    assert_eq!(showcase.len(), 1);
    assert_eq!(showcase[0].product_id, row.id);
}

#[sqlx::test(migrations = "../../migrations")]
async fn manager_cannot_post_to_inactive_or_foreign_store(pool: sqlx::PgPool) {
    let own = insert_test_store(&pool, "own", true).await;
    let closed = insert_test_store(&pool, "closed", false).await;
    let foreign = insert_test_store(&pool, "foreign", true).await;
    let manager = insert_test_manager(&pool, 777, &[own, closed]).await;

    assert!(manager_can_post_to(&pool, manager, own).await.unwrap().is_some());
    assert!(manager_can_post_to(&pool, manager, closed).await.unwrap().is_none());
    assert!(manager_can_post_to(&pool, manager, foreign).await.unwrap().is_none());
}

// ---------------------------------------------------------------------------
// Section 3: Categories and showcase
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn category_listing_includes_direct_children(pool: sqlx::PgPool) {
    let root = create_category(&pool, "Букеты", "bukety", None, 0)
        .await
        .expect("root");
    let child = create_category(&pool, "Пионы", "piony", Some(root.id), 0)
        .await
        .expect("child");
    let in_child = insert_test_product(&pool, "peony", Some(child.id), true, false, 0).await;
    let in_root = insert_test_product(&pool, "mix", Some(root.id), true, false, 0).await;

    let ids = category_with_children_ids(&pool, root.id).await.expect("ids");
    let rows = list_products_in_categories(&pool, &ids, None)
        .await
        .expect("products");
    assert_eq!(
        rows.iter().map(|p| p.id).collect::<Vec<_>>(),
        vec![in_root, in_child]
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn duplicate_sibling_category_is_unique_violation(pool: sqlx::PgPool) {
    create_category(&pool, "Розы", "", None, 0).await.expect("first");
    let err = create_category(&pool, "Розы", "", None, 0).await.unwrap_err();
    assert!(err.is_unique_violation());
}

#[sqlx::test(migrations = "../../migrations")]
async fn deleting_category_cascades_and_nulls_products(pool: sqlx::PgPool) {
    let root = create_category(&pool, "Root", "", None, 0).await.unwrap();
    let child = create_category(&pool, "Child", "", Some(root.id), 0)
        .await
        .unwrap();
    let product = insert_test_product(&pool, "p", Some(child.id), true, false, 0).await;

    assert!(delete_category(&pool, root.id).await.unwrap());
    assert!(get_category(&pool, child.id).await.unwrap().is_none());
    let row = get_product(&pool, product, true).await.unwrap().expect("product");
    assert!(row.category_id.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn reparenting_to_root_clears_parent(pool: sqlx::PgPool) {
    let root = create_category(&pool, "Root", "", None, 0).await.unwrap();
    let child = create_category(&pool, "Child", "", Some(root.id), 0)
        .await
        .unwrap();
    let moved = update_category(&pool, child.id, None, Some(None))
        .await
        .expect("update");
    assert!(moved.parent_id.is_none());
    assert_eq!(moved.name, "Child");
}

#[sqlx::test(migrations = "../../migrations")]
async fn homepage_showcase_orders_by_sort_then_newest(pool: sqlx::PgPool) {
    let a = insert_test_product(&pool, "a", None, true, true, 2).await;
    let b = insert_test_product(&pool, "b", None, true, true, 1).await;
    let c = insert_test_product(&pool, "c", None, true, true, 1).await;
    insert_test_product(&pool, "hidden", None, false, true, 0).await;

    let rows = list_homepage_showcase(&pool, 24).await.expect("showcase");
    assert_eq!(rows.iter().map(|p| p.id).collect::<Vec<_>>(), vec![c, b, a]);

    let updated = reorder_showcase(
        &pool,
        &[
            ShowcaseOrder {
                product_id: a,
                sort_order: 0,
            },
            ShowcaseOrder {
                product_id: 9999,
                sort_order: 0,
            },
        ],
    )
    .await
    .expect("reorder");
    assert_eq!(updated, 1);

    let rows = list_homepage_showcase(&pool, 24).await.expect("showcase");
    assert_eq!(rows[0].id, a);
}

#[sqlx::test(migrations = "../../migrations")]
async fn store_showcase_orders_by_sort_then_newest_product(pool: sqlx::PgPool) {
    let store = insert_test_store(&pool, "north", true).await;
    let older = insert_test_product(&pool, "older", None, true, false, 0).await;
    let newer = insert_test_product(&pool, "newer", None, true, false, 0).await;
    let pinned_first = insert_test_product(&pool, "pinned", None, true, false, 0).await;

    // Pin the newer product first so item ids run opposite to product ids.
    for (product_id, sort_order) in [(newer, 1), (older, 1), (pinned_first, 0)] {
        sqlx::query(
            "INSERT INTO showcase_items (store_id, product_id, sort_order) VALUES ($1, $2, $3)",
        )
        .bind(store)
        .bind(product_id)
        .bind(sort_order)
        .execute(&pool)
        .await
        .expect("pin product");
    }

    let rows = list_store_showcase(&pool, store).await.expect("store showcase");
    assert_eq!(
        rows.iter().map(|r| r.product_id).collect::<Vec<_>>(),
        vec![pinned_first, newer, older]
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn pinning_twice_moves_the_item_and_unpin_reports_presence(pool: sqlx::PgPool) {
    let store = insert_test_store(&pool, "north", true).await;
    let rose = insert_test_product(&pool, "rose", None, true, false, 0).await;
    let tulip = insert_test_product(&pool, "tulip", None, true, false, 0).await;

    pin_showcase_item(&pool, store, rose, 0).await.expect("pin rose");
    pin_showcase_item(&pool, store, tulip, 1).await.expect("pin tulip");
    pin_showcase_item(&pool, store, rose, 5).await.expect("move rose");

    let rows = list_store_showcase(&pool, store).await.unwrap();
    assert_eq!(
        rows.iter().map(|r| (r.product_id, r.sort_order)).collect::<Vec<_>>(),
        vec![(tulip, 1), (rose, 5)]
    );

    let err = pin_showcase_item(&pool, store + 1000, rose, 0)
        .await
        .expect_err("unknown store");
    assert!(err.is_foreign_key_violation());

    assert!(unpin_showcase_item(&pool, store, rose).await.unwrap());
    assert!(!unpin_showcase_item(&pool, store, rose).await.unwrap());
    assert_eq!(list_store_showcase(&pool, store).await.unwrap().len(), 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn category_cards_use_two_newest_products(pool: sqlx::PgPool) {
    let root = create_category(&pool, "Букеты", "bukety", None, 0)
        .await
        .unwrap();
    create_category(&pool, "Пустая", "pustaya", None, 1)
        .await
        .unwrap();
    insert_test_product(&pool, "old", Some(root.id), true, false, 0).await;
    let newer = insert_test_product(&pool, "new", None, true, false, 0).await;
    sqlx::query("INSERT INTO product_categories (product_id, category_id) VALUES ($1, $2)")
        .bind(newer)
        .bind(root.id)
        .execute(&pool)
        .await
        .unwrap();

    let cards = list_category_cards(&pool).await.expect("cards");
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].name, "Букеты");
    assert_eq!(
        cards[0].first_image.as_deref(),
        Some("https://old.example/img/new.jpg")
    );
    assert_eq!(
        cards[0].second_image.as_deref(),
        Some("https://old.example/img/old.jpg")
    );
}

// ---------------------------------------------------------------------------
// Section 4: Banners and reviews
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn current_banner_respects_window_and_order(pool: sqlx::PgPool) {
    let mut expired = banner("expired", 0);
    expired.ends_on = Some(date(2026, 1, 1));
    create_hero_banner(&pool, &expired).await.unwrap();
    let mut inactive = banner("inactive", 0);
    inactive.is_active = false;
    create_hero_banner(&pool, &inactive).await.unwrap();
    create_hero_banner(&pool, &banner("later", 5)).await.unwrap();
    let mut spring = banner("spring", 1);
    spring.starts_on = Some(date(2026, 3, 1));
    spring.ends_on = Some(date(2026, 3, 31));
    create_hero_banner(&pool, &spring).await.unwrap();

    let current = current_hero_banner(&pool, date(2026, 3, 8))
        .await
        .unwrap()
        .expect("banner");
    assert_eq!(current.name, "spring");

    let current = current_hero_banner(&pool, date(2026, 4, 8))
        .await
        .unwrap()
        .expect("banner");
    assert_eq!(current.name, "later");
}

#[sqlx::test(migrations = "../../migrations")]
async fn submitted_review_is_hidden_until_published(pool: sqlx::PgPool) {
    let draft = ReviewDraft {
        author: "Анна".to_string(),
        company: String::new(),
        text: "Очень красивый букет, спасибо!".to_string(),
        rating: 5,
    };
    let review = create_public_review(&pool, &draft).await.expect("create");
    assert!(!review.is_published);
    assert_eq!(review.source_url, "frontend_form");
    assert_eq!(review.sort_order, 9999);

    assert!(list_reviews(&pool, false).await.unwrap().is_empty());
    assert_eq!(list_reviews(&pool, true).await.unwrap().len(), 1);

    update_review(
        &pool,
        review.id,
        ReviewPatch {
            is_published: Some(true),
            sort_order: None,
        },
    )
    .await
    .expect("publish");
    assert_eq!(list_reviews(&pool, false).await.unwrap().len(), 1);
}

// ---------------------------------------------------------------------------
// Section 5: Carts and slugs
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn cart_round_trips_and_checkout_empties_it(pool: sqlx::PgPool) {
    let rose = insert_test_product(&pool, "Роза", None, true, false, 0).await;
    let session = Uuid::new_v4();
    assert!(load_cart(&pool, session).await.unwrap().is_empty());

    let mut cart = Cart::new();
    cart.add_one(rose);
    cart.set_qty(999_999, 2);
    save_cart(&pool, session, &cart).await.expect("save");
    assert_eq!(load_cart(&pool, session).await.unwrap(), cart);

    let order: PlacedOrder = checkout(&mut cart, "Ира", "+375291234567", "").expect("checkout");
    let order_id = save_checkout(&pool, session, &order, None)
        .await
        .expect("save checkout");

    let row = get_cart_session(&pool, session)
        .await
        .unwrap()
        .expect("session row");
    assert!(row.items.0.is_empty());
    assert_eq!(row.last_order.expect("order").0.items.count(), 3);

    let stored = get_order(&pool, order_id).await.unwrap().expect("order row");
    assert_eq!(stored.session_id, Some(session));
    assert_eq!(stored.customer_name, "Ира");
    // The line for the vanished product is dropped.
    let items = list_order_items(&pool, &[order_id]).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!((items[0].product_id, items[0].qty), (rose, 1));
    assert_eq!(items[0].title, "Роза");
}

#[sqlx::test(migrations = "../../migrations")]
async fn purge_removes_only_idle_sessions(pool: sqlx::PgPool) {
    let fresh = Uuid::new_v4();
    let stale = Uuid::new_v4();
    save_cart(&pool, fresh, &Cart::new()).await.unwrap();
    save_cart(&pool, stale, &Cart::new()).await.unwrap();
    sqlx::query("UPDATE cart_sessions SET updated_at = NOW() - INTERVAL '30 days' WHERE session_id = $1")
        .bind(stale)
        .execute(&pool)
        .await
        .unwrap();

    assert_eq!(purge_idle_carts(&pool, 14).await.unwrap(), 1);
    assert!(get_cart_session(&pool, fresh).await.unwrap().is_some());
    assert!(get_cart_session(&pool, stale).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn missing_slugs_are_listed_and_filled(pool: sqlx::PgPool) {
    create_category(&pool, "Букеты", "", None, 0).await.unwrap();
    create_category(&pool, "Розы", "rozy", None, 0).await.unwrap();

    let missing = list_missing_slugs(&pool, SlugTarget::Category).await.unwrap();
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].label, "Букеты");

    set_slug(&pool, SlugTarget::Category, missing[0].id, "bukety")
        .await
        .unwrap();
    let mut taken = list_taken_slugs(&pool, SlugTarget::Category).await.unwrap();
    taken.sort();
    assert_eq!(taken, vec!["bukety".to_string(), "rozy".to_string()]);
}

// ---------------------------------------------------------------------------
// Section 6: Orders and discounts
// ---------------------------------------------------------------------------

fn placed(lines: &[(i64, i64)]) -> PlacedOrder {
    let mut cart = Cart::new();
    for (product_id, qty) in lines {
        cart.set_qty(*product_id, *qty);
    }
    checkout(&mut cart, "Ольга", "+375291112233", "").expect("checkout")
}

#[sqlx::test(migrations = "../../migrations")]
async fn staff_order_with_unknown_product_writes_nothing(pool: sqlx::PgPool) {
    let rose = insert_test_product(&pool, "Роза", None, true, false, 0).await;

    let err = create_order(&pool, &placed(&[(rose, 1), (999_999, 1)]), None)
        .await
        .expect_err("unknown product");
    assert!(err.is_foreign_key_violation(), "got {err:?}");
    assert!(list_orders(&pool, 10).await.unwrap().is_empty());

    let order_id = create_order(&pool, &placed(&[(rose, 4)]), None)
        .await
        .expect("create");
    let items = list_order_items(&pool, &[order_id]).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].price, Some(Decimal::from(50)));

    assert!(delete_order(&pool, order_id).await.unwrap());
    assert!(!delete_order(&pool, order_id).await.unwrap());
    assert!(list_order_items(&pool, &[order_id]).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn deleting_discount_keeps_orders_that_used_it(pool: sqlx::PgPool) {
    let rose = insert_test_product(&pool, "Роза", None, true, false, 0).await;
    let discount = create_discount(&pool, "SPRING", 10).await.expect("create");

    let dup = create_discount(&pool, "SPRING", 20).await.expect_err("duplicate");
    assert!(dup.is_unique_violation());
    assert!(matches!(
        update_discount(&pool, discount.id + 1000, "X", 5).await,
        Err(DbError::NotFound)
    ));

    let order_id = create_order(&pool, &placed(&[(rose, 1)]), Some(discount.id))
        .await
        .expect("create order");
    let stored = get_order(&pool, order_id).await.unwrap().expect("order");
    assert_eq!(stored.discount_code.as_deref(), Some("SPRING"));
    assert_eq!(stored.discount_percent, Some(10));

    let renamed = update_discount(&pool, discount.id, "SUMMER", 15)
        .await
        .expect("update");
    assert_eq!(renamed.code, "SUMMER");
    assert!(get_discount_by_code(&pool, "SPRING").await.unwrap().is_none());

    assert!(delete_discount(&pool, discount.id).await.unwrap());
    let stored = get_order(&pool, order_id).await.unwrap().expect("order survives");
    assert_eq!(stored.discount_id, None);
    assert!(list_discounts(&pool).await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Section 7: Gallery images and row timestamps
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn gallery_images_are_scoped_to_their_product(pool: sqlx::PgPool) {
    let rose = insert_test_product(&pool, "rose", None, true, false, 0).await;
    let tulip = insert_test_product(&pool, "tulip", None, true, false, 0).await;

    let second = add_product_image(&pool, rose, "products/rose-2.jpg", 2)
        .await
        .expect("add");
    let first = add_product_image(&pool, rose, "products/rose-1.jpg", 1)
        .await
        .expect("add");
    add_product_image(&pool, tulip, "https://old.example/tulip.jpg", 0)
        .await
        .expect("add");

    let relations = load_product_relations(&pool, rose).await.unwrap();
    assert_eq!(
        relations.images.iter().map(|i| i.id).collect::<Vec<_>>(),
        vec![first.id, second.id]
    );
    assert_eq!(list_all_product_images(&pool).await.unwrap().len(), 3);

    let err = add_product_image(&pool, 999_999, "products/x.jpg", 0)
        .await
        .expect_err("unknown product");
    assert!(err.is_foreign_key_violation());

    // The image id alone is not enough; it must belong to the product.
    assert!(!delete_product_image(&pool, tulip, first.id).await.unwrap());
    assert!(delete_product_image(&pool, rose, first.id).await.unwrap());
    assert_eq!(list_all_product_images(&pool).await.unwrap().len(), 2);
}

async fn backdate_product(pool: &sqlx::PgPool, id: i64) {
    sqlx::query("UPDATE products SET updated_at = '2000-01-01T00:00:00Z' WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .expect("backdate");
}

async fn updated_year(pool: &sqlx::PgPool, id: i64) -> i32 {
    get_product(pool, id, true)
        .await
        .unwrap()
        .expect("product")
        .updated_at
        .year()
}

#[sqlx::test(migrations = "../../migrations")]
async fn writes_advance_updated_at(pool: sqlx::PgPool) {
    let rose = insert_test_product(&pool, "rose", None, true, false, 0).await;

    backdate_product(&pool, rose).await;
    set_product_price(&pool, rose, Decimal::from(75)).await.expect("price");
    assert!(updated_year(&pool, rose).await > 2000);

    backdate_product(&pool, rose).await;
    set_product_published(&pool, rose, false).await.expect("publish");
    assert!(updated_year(&pool, rose).await > 2000);
}
