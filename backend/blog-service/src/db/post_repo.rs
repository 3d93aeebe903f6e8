use crate::models::{NewPost, Post, PostChanges, PostFilter};
use sqlx::{PgPool, Postgres, QueryBuilder, Row};

/// Columns of a hydrated post; expects `p` (posts), `u` (users) and `g` (groups) aliases
const POST_COLUMNS: &str = r#"
    p.id, p.text, p.created_at, p.image, p.author_id, u.username AS author_username,
    p.group_id, g.slug AS group_slug, g.title AS group_title
"#;

fn push_post_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: PostFilter) {
    match filter {
        PostFilter::All => {}
        PostFilter::Group(group_id) => {
            qb.push(" WHERE p.group_id = ").push_bind(group_id);
        }
        PostFilter::Author(author_id) => {
            qb.push(" WHERE p.author_id = ").push_bind(author_id);
        }
        PostFilter::FollowedBy(user_id) => {
            qb.push(" WHERE p.author_id IN (SELECT f.author_id FROM follows f WHERE f.user_id = ")
                .push_bind(user_id)
                .push(")");
        }
    }
}

/// Insert a post; `created_at` is assigned by the database
pub async fn create_post(pool: &PgPool, post: &NewPost) -> Result<Post, sqlx::Error> {
    let sql = format!(
        r#"
        WITH p AS (
            INSERT INTO posts (author_id, text, group_id, image)
            VALUES ($1, $2, $3, $4)
            RETURNING *
        )
        SELECT {POST_COLUMNS}
        FROM p
        JOIN users u ON u.id = p.author_id
        LEFT JOIN groups g ON g.id = p.group_id
        "#
    );

    sqlx::query_as::<_, Post>(&sql)
        .bind(post.author_id)
        .bind(&post.text)
        .bind(post.group_id)
        .bind(post.image.as_deref())
        .fetch_one(pool)
        .await
}

/// Find a post by ID
pub async fn find_post_by_id(pool: &PgPool, post_id: i64) -> Result<Option<Post>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {POST_COLUMNS}
        FROM posts p
        JOIN users u ON u.id = p.author_id
        LEFT JOIN groups g ON g.id = p.group_id
        WHERE p.id = $1
        "#
    );

    sqlx::query_as::<_, Post>(&sql)
        .bind(post_id)
        .fetch_optional(pool)
        .await
}

/// Overwrite the editable columns. `author_id` and `created_at` are never touched.
pub async fn update_post(
    pool: &PgPool,
    post_id: i64,
    changes: &PostChanges,
) -> Result<Option<Post>, sqlx::Error> {
    let sql = format!(
        r#"
        WITH p AS (
            UPDATE posts
            SET text = $2, group_id = $3, image = $4
            WHERE id = $1
            RETURNING *
        )
        SELECT {POST_COLUMNS}
        FROM p
        JOIN users u ON u.id = p.author_id
        LEFT JOIN groups g ON g.id = p.group_id
        "#
    );

    sqlx::query_as::<_, Post>(&sql)
        .bind(post_id)
        .bind(&changes.text)
        .bind(changes.group_id)
        .bind(changes.image.as_deref())
        .fetch_optional(pool)
        .await
}

/// Count posts matching a feed filter
pub async fn count_posts(pool: &PgPool, filter: PostFilter) -> Result<i64, sqlx::Error> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) AS count FROM posts p");
    push_post_filter(&mut qb, filter);

    let row = qb.build().fetch_one(pool).await?;
    Ok(row.get::<i64, _>("count"))
}

/// Fetch one page of a feed, newest first
pub async fn list_posts(
    pool: &PgPool,
    filter: PostFilter,
    limit: i64,
    offset: i64,
) -> Result<Vec<Post>, sqlx::Error> {
    let mut qb = QueryBuilder::<Postgres>::new(format!(
        r#"
        SELECT {POST_COLUMNS}
        FROM posts p
        JOIN users u ON u.id = p.author_id
        LEFT JOIN groups g ON g.id = p.group_id
        "#
    ));
    push_post_filter(&mut qb, filter);
    qb.push(" ORDER BY p.created_at DESC, p.id DESC LIMIT ")
        .push_bind(limit)
        .push(" OFFSET ")
        .push_bind(offset);

    qb.build_query_as::<Post>().fetch_all(pool).await
}
