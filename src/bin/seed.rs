//! Seeds the catalogue with the starter sports categories and items. The
//! owning user comes from `SEED_USER_NAME` / `SEED_USER_EMAIL`.

use sqlx::postgres::PgPoolOptions;
use std::env;

struct SeedItem {
    name: &'static str,
    slug: &'static str,
    description: Option<&'static str>,
}

struct SeedCategory {
    name: &'static str,
    slug: &'static str,
    items: &'static [SeedItem],
}

const CATALOGUE: &[SeedCategory] = &[
    SeedCategory {
        name: "Soccer",
        slug: "soccer",
        items: &[
            SeedItem {
                name: "Soccer Ball",
                slug: "soccer_ball",
                description: None,
            },
            SeedItem {
                name: "Soccer Pads",
                slug: "soccer_pads",
                description: None,
            },
            SeedItem {
                name: "Soccer Shoes",
                slug: "soccer_shoes",
                description: None,
            },
            SeedItem {
                name: "Soccer Pants",
                slug: "soccer_pants",
                description: None,
            },
        ],
    },
    SeedCategory {
        name: "Basketball",
        slug: "basketball",
        items: &[
            SeedItem {
                name: "Basketball",
                slug: "basketball",
                description: None,
            },
            SeedItem {
                name: "Basketball Sneakers",
                slug: "basketball_sneakers",
                description: None,
            },
            SeedItem {
                name: "Basketball Pants",
                slug: "basketball_pants",
                description: None,
            },
        ],
    },
    SeedCategory {
        name: "Baseball",
        slug: "baseball",
        items: &[
            SeedItem {
                name: "Baseball",
                slug: "baseball",
                description: None,
            },
            SeedItem {
                name: "Baseball Bat",
                slug: "baseball_bat",
                description: None,
            },
            SeedItem {
                name: "Baseball Gloves",
                slug: "baseball_gloves",
                description: None,
            },
        ],
    },
    SeedCategory {
        name: "Hockey",
        slug: "hockey",
        items: &[
            SeedItem {
                name: "Hockey Ball",
                slug: "hockey_ball",
                description: None,
            },
            SeedItem {
                name: "Hockey Stick",
                slug: "hockey_stick",
                description: None,
            },
            SeedItem {
                name: "Hockey Helmet",
                slug: "hockey_helmet",
                description: None,
            },
        ],
    },
    SeedCategory {
        name: "Cricket",
        slug: "cricket",
        items: &[
            SeedItem {
                name: "Cricket Ball",
                slug: "cricket_ball",
                description: Some("A cricket ball made with a core of cork, which is layered with tightly wound string, and covered by a leather case with a slightly raised sewn seam."),
            },
            SeedItem {
                name: "Cricket Bat",
                slug: "cricket_bat",
                description: Some("A cricket bat is a specialised piece of equipment used by batsmen in the sport of cricket to hit the ball, typically consisting of a cane handle attached to a flat-fronted willow-wood blade. The length of the bat may be no more than 38 inches (965 mm) and the width no more than 4.25 inches (108 mm). Its use is first mentioned in 1624. Since 1979, the rule change stipulated that bats can only be made from wood."),
            },
            SeedItem {
                name: "Cricket Helmet",
                slug: "cricket_helmet",
                description: Some("In the sport of cricket, batsmen often wear a helmet to protect themselves from injury or concussion by the cricket ball, which is very hard and can be bowled to them at speeds over 90 miles per hour (140 km/h). Cricket helmets cover the whole of the skull, and have a grill or perspex visor to protect the face. Often constructed with a carbon fibre and Kevlar shell, the helmet is designed to deflect cricket balls as well as shield the wearer from impact, and its liner includes an inflatable element to tightly fit the helmet to its wearer's head."),
            },
            SeedItem {
                name: "Batting Gloves",
                slug: "cricket_batting_gloves",
                description: None,
            },
            SeedItem {
                name: "Wicketkeeping Gloves",
                slug: "cricket_wicketkeeping_gloves",
                description: None,
            },
            SeedItem {
                name: "Batting Pads",
                slug: "cricket_batting_pads",
                description: None,
            },
            SeedItem {
                name: "Spiked Shoes",
                slug: "cricket_spiked_shoes",
                description: None,
            },
        ],
    },
];

#[tokio::main]
async fn main() {
    let database_url = env::var("DATABASE_URL").expect("DATABASE_URL not set");
    let seed_user_name = env::var("SEED_USER_NAME").expect("SEED_USER_NAME not set");
    let seed_user_email = env::var("SEED_USER_EMAIL").expect("SEED_USER_EMAIL not set");

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(database_url.as_str())
        .await
        .expect("Error connecting to database");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    let user_id = sqlx::query_scalar::<_, i32>(
        "INSERT INTO users (name, email) VALUES ($1, $2) RETURNING id",
    )
    .bind(seed_user_name)
    .bind(seed_user_email)
    .fetch_one(&pool)
    .await
    .expect("Failed to create the seed user");

    for category in CATALOGUE {
        let category_id = sqlx::query_scalar::<_, i32>(
            "INSERT INTO categories (name, slug, user_id) VALUES ($1, $2, $3) RETURNING id",
        )
        .bind(category.name)
        .bind(category.slug)
        .bind(user_id)
        .fetch_one(&pool)
        .await
        .unwrap_or_else(|err| panic!("Failed to create category {}: {}", category.slug, err));

        for item in category.items {
            sqlx::query(
                "INSERT INTO menu_items (name, slug, description, category_id) VALUES ($1, $2, $3, $4)",
            )
            .bind(item.name)
            .bind(item.slug)
            .bind(item.description)
            .bind(category_id)
            .execute(&pool)
            .await
            .unwrap_or_else(|err| panic!("Failed to create menu item {}: {}", item.slug, err));
        }
    }

    println!("All tables were seeded successfully!");
}
