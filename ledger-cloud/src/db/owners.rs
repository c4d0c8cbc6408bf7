use sqlx::PgPool;

#[derive(sqlx::FromRow)]
pub struct OwnerAccount {
    pub uid: String,
    pub email: String,
    pub hashed_password: String,
    pub name: Option<String>,
    pub created_at: i64,
}

pub async fn create(pool: &PgPool, account: &OwnerAccount) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO owners (uid, email, hashed_password, name, created_at)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(&account.uid)
    .bind(&account.email)
    .bind(&account.hashed_password)
    .bind(&account.name)
    .bind(account.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<OwnerAccount>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM owners WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
}
