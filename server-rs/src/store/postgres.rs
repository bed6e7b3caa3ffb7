use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, QueryBuilder, Row};
use uuid::Uuid;

use super::*;

const USER_COLUMNS: &str = "id, email, full_name, password_hash, role, avatar_url, created_at";
const TOURNAMENT_COLUMNS: &str = "id, name, format, description, game_name, organizer_id, \
     start_date, end_date, max_players, number_of_players, status, competitor, avatar_url, created_at";
const COMPETITOR_COLUMNS: &str = "id, name, logo_url, description, mail, tournament_id, user_id";
const MATCH_COLUMNS: &str =
    "id, tournament_id, team_a, team_b, scheduled_at, status, score_a, score_b, created_at";
const NEWS_COLUMNS: &str =
    "id, title, content, author_id, tournament_id, images, status, published_at, created_at";

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connects, then brings the schema up to date.
    pub async fn connect(config: &Config) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .min_connections(config.db.pool_min)
            .max_connections(config.db.pool_max)
            .acquire_timeout(Duration::from_secs(5))
            .connect(&config.database_url())
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!(
            host = %config.db.host,
            database = %config.db.database,
            "connected to Postgres"
        );
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Text column holding one of an enum's lowercase names.
fn enum_col<T>(row: &PgRow, column: &str) -> Result<T, sqlx::Error>
where
    T: FromStr<Err = UnknownVariant>,
{
    let raw: String = row.try_get(column)?;
    raw.parse().map_err(|e: UnknownVariant| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

fn user_from_row(row: &PgRow) -> Result<User, sqlx::Error> {
    Ok(User {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        full_name: row.try_get("full_name")?,
        password_hash: row.try_get("password_hash")?,
        role: enum_col(row, "role")?,
        avatar_url: row.try_get("avatar_url")?,
        created_at: row.try_get("created_at")?,
    })
}

fn tournament_from_row(row: &PgRow) -> Result<Tournament, sqlx::Error> {
    Ok(Tournament {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        format: row.try_get("format")?,
        description: row.try_get("description")?,
        game_name: row.try_get("game_name")?,
        organizer_id: row.try_get("organizer_id")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        max_players: row.try_get("max_players")?,
        number_of_players: row.try_get("number_of_players")?,
        status: enum_col(row, "status")?,
        competitor: row.try_get("competitor")?,
        avatar_url: row.try_get("avatar_url")?,
        created_at: row.try_get("created_at")?,
    })
}

fn competitor_from_row(row: &PgRow) -> Result<Competitor, sqlx::Error> {
    Ok(Competitor {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        logo_url: row.try_get("logo_url")?,
        description: row.try_get("description")?,
        mail: row.try_get("mail")?,
        tournament_id: row.try_get("tournament_id")?,
        user_id: row.try_get("user_id")?,
    })
}

fn match_from_row(row: &PgRow) -> Result<Match, sqlx::Error> {
    Ok(Match {
        id: row.try_get("id")?,
        tournament_id: row.try_get("tournament_id")?,
        team_a: row.try_get("team_a")?,
        team_b: row.try_get("team_b")?,
        scheduled_at: row.try_get("scheduled_at")?,
        status: enum_col(row, "status")?,
        score: Score {
            a: row.try_get("score_a")?,
            b: row.try_get("score_b")?,
        },
        created_at: row.try_get("created_at")?,
    })
}

fn news_from_row(row: &PgRow) -> Result<News, sqlx::Error> {
    Ok(News {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        author_id: row.try_get("author_id")?,
        tournament_id: row.try_get("tournament_id")?,
        images: row.try_get("images")?,
        status: enum_col(row, "status")?,
        published_at: row.try_get("published_at")?,
        created_at: row.try_get("created_at")?,
    })
}

fn map_rows<T>(
    rows: Vec<PgRow>,
    f: fn(&PgRow) -> Result<T, sqlx::Error>,
) -> Result<Vec<T>, sqlx::Error> {
    rows.iter().map(f).collect()
}

/// `ILIKE` pattern matching `term` anywhere, with wildcards in the term
/// taken literally.
fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn push_time_bound(qb: &mut QueryBuilder<'_, Postgres>, column: &str, bound: TimeBound) {
    qb.push(format!(" AND {column} "));
    match bound {
        TimeBound::NotBefore(t) => qb.push(">= ").push_bind(t),
        TimeBound::NotAfter(t) => qb.push("<= ").push_bind(t),
        TimeBound::After(t) => qb.push("> ").push_bind(t),
    };
}

/// Postgres takes LIMIT/OFFSET as BIGINT; counts past its range saturate.
fn bigint(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn push_window(qb: &mut QueryBuilder<'_, Postgres>, window: Window) {
    if let Some(limit) = window.limit {
        qb.push(" LIMIT ").push_bind(bigint(limit));
    }
    qb.push(" OFFSET ").push_bind(bigint(window.offset));
}

fn push_tournament_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &TournamentFilter) {
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(format) = &filter.format {
        qb.push(" AND format = ").push_bind(format.clone());
    }
    if let Some(game) = &filter.game_name {
        qb.push(" AND game_name = ").push_bind(game.clone());
    }
    if let Some(organizer) = filter.organizer_id {
        qb.push(" AND organizer_id = ").push_bind(organizer);
    }
    if let Some(bound) = filter.starts {
        push_time_bound(qb, "start_date", bound);
    }
    if let Some(search) = &filter.search {
        let pattern = like_pattern(search);
        qb.push(" AND (name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR game_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

fn push_match_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &MatchFilter) {
    if let Some(tournament) = filter.tournament_id {
        qb.push(" AND tournament_id = ").push_bind(tournament);
    }
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(competitor) = filter.competitor_id {
        qb.push(" AND (team_a = ")
            .push_bind(competitor)
            .push(" OR team_b = ")
            .push_bind(competitor)
            .push(")");
    }
    if let Some(bound) = filter.scheduled {
        push_time_bound(qb, "scheduled_at", bound);
    }
}

fn push_news_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &NewsFilter) {
    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status.as_str());
    }
    if let Some(tournament) = filter.tournament_id {
        qb.push(" AND tournament_id = ").push_bind(tournament);
    }
    if let Some(author) = filter.author_id {
        qb.push(" AND author_id = ").push_bind(author);
    }
    if let Some(search) = &filter.search {
        let pattern = like_pattern(search);
        qb.push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR content ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<User> {
        schema(user.validate())?;
        let user = user.into_user();
        let row = sqlx::query(&format!(
            "INSERT INTO users ({USER_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7) RETURNING {USER_COLUMNS}"
        ))
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(&user.avatar_url)
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(user_from_row(&row)?)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(user_from_row).transpose()?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(user_from_row).transpose()?)
    }

    async fn find_users(&self, ids: &[Uuid]) -> StoreResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)"))
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(map_rows(rows, user_from_row)?)
    }

    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> StoreResult<Option<User>> {
        schema(update.validate())?;
        let row = sqlx::query(&format!(
            r#"
            UPDATE users
            SET full_name = COALESCE($2, full_name),
                avatar_url = CASE WHEN $3 THEN $4 ELSE avatar_url END
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&update.full_name)
        .bind(update.avatar_url.is_some())
        .bind(update.avatar_url.clone().flatten())
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(user_from_row).transpose()?)
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> StoreResult<bool> {
        let result = sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl TournamentStore for PgStore {
    async fn create_tournament(&self, tournament: NewTournament) -> StoreResult<Tournament> {
        schema(tournament.validate())?;
        let t = tournament.into_tournament();
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO tournaments ({TOURNAMENT_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {TOURNAMENT_COLUMNS}
            "#
        ))
        .bind(t.id)
        .bind(&t.name)
        .bind(&t.format)
        .bind(&t.description)
        .bind(&t.game_name)
        .bind(t.organizer_id)
        .bind(t.start_date)
        .bind(t.end_date)
        .bind(t.max_players)
        .bind(t.number_of_players)
        .bind(t.status.as_str())
        .bind(&t.competitor)
        .bind(&t.avatar_url)
        .bind(t.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(tournament_from_row(&row)?)
    }

    async fn find_tournament(&self, id: Uuid) -> StoreResult<Option<Tournament>> {
        let row = sqlx::query(&format!(
            "SELECT {TOURNAMENT_COLUMNS} FROM tournaments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(tournament_from_row).transpose()?)
    }

    async fn find_tournaments(&self, ids: &[Uuid]) -> StoreResult<Vec<Tournament>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query(&format!(
            "SELECT {TOURNAMENT_COLUMNS} FROM tournaments WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(map_rows(rows, tournament_from_row)?)
    }

    async fn list_tournaments(
        &self,
        filter: &TournamentFilter,
        window: Window,
    ) -> StoreResult<Paged<Tournament>> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM tournaments WHERE 1=1");
        push_tournament_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::new(format!(
            "SELECT {TOURNAMENT_COLUMNS} FROM tournaments WHERE 1=1"
        ));
        push_tournament_filter(&mut query, filter);
        query.push(match filter.order {
            TournamentOrder::Newest => " ORDER BY created_at DESC",
            TournamentOrder::StartDate => " ORDER BY start_date ASC NULLS LAST, created_at DESC",
        });
        push_window(&mut query, window);
        let rows = query.build().fetch_all(&self.pool).await?;

        Ok(Paged {
            items: map_rows(rows, tournament_from_row)?,
            total: total as u64,
        })
    }

    async fn update_tournament(
        &self,
        id: Uuid,
        update: TournamentUpdate,
    ) -> StoreResult<Option<Tournament>> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "SELECT {TOURNAMENT_COLUMNS} FROM tournaments WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };
        let mut t = tournament_from_row(&row)?;
        schema(update.validate_against(&t))?;
        update.apply(&mut t);

        let row = sqlx::query(&format!(
            r#"
            UPDATE tournaments
            SET name = $2, format = $3, description = $4, game_name = $5, avatar_url = $6,
                start_date = $7, end_date = $8, status = $9, max_players = $10
            WHERE id = $1
            RETURNING {TOURNAMENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&t.name)
        .bind(&t.format)
        .bind(&t.description)
        .bind(&t.game_name)
        .bind(&t.avatar_url)
        .bind(t.start_date)
        .bind(t.end_date)
        .bind(t.status.as_str())
        .bind(t.max_players)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(tournament_from_row(&row)?))
    }

    async fn delete_tournament(&self, id: Uuid) -> StoreResult<Option<Tournament>> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM matches WHERE tournament_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            r#"
            DELETE FROM competitors
            WHERE tournament_id = $1
               OR id = ANY(SELECT unnest(competitor) FROM tournaments WHERE id = $1)
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;
        let row = sqlx::query(&format!(
            "DELETE FROM tournaments WHERE id = $1 RETURNING {TOURNAMENT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(row.as_ref().map(tournament_from_row).transpose()?)
    }

    async fn register_competitor(&self, competitor: NewCompetitor) -> StoreResult<RegisterOutcome> {
        schema(competitor.validate())?;
        let mut tx = self.pool.begin().await?;

        // The row lock serializes concurrent registrations for one tournament.
        let row = sqlx::query(&format!(
            "SELECT {TOURNAMENT_COLUMNS} FROM tournaments WHERE id = $1 FOR UPDATE"
        ))
        .bind(competitor.tournament_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(row) = row else {
            return Ok(RegisterOutcome::TournamentNotFound);
        };
        let current = tournament_from_row(&row)?;
        if current.status != TournamentStatus::Upcoming {
            return Ok(RegisterOutcome::NotOpen);
        }
        if current.is_full() {
            return Ok(RegisterOutcome::Full);
        }

        let competitor = competitor.into_competitor();
        let inserted = sqlx::query(&format!(
            "INSERT INTO competitors ({COMPETITOR_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COMPETITOR_COLUMNS}"
        ))
        .bind(competitor.id)
        .bind(&competitor.name)
        .bind(&competitor.logo_url)
        .bind(&competitor.description)
        .bind(&competitor.mail)
        .bind(competitor.tournament_id)
        .bind(competitor.user_id)
        .fetch_one(&mut *tx)
        .await;
        let competitor = match inserted {
            Ok(row) => competitor_from_row(&row)?,
            Err(e) => {
                return match StoreError::from(e) {
                    StoreError::Duplicate(_) => Ok(RegisterOutcome::AlreadyRegistered),
                    other => Err(other),
                }
            }
        };

        let row = sqlx::query(&format!(
            r#"
            UPDATE tournaments
            SET competitor = array_append(competitor, $2),
                number_of_players = number_of_players + 1
            WHERE id = $1
            RETURNING {TOURNAMENT_COLUMNS}
            "#
        ))
        .bind(competitor.tournament_id)
        .bind(competitor.id)
        .fetch_one(&mut *tx)
        .await?;
        let tournament = tournament_from_row(&row)?;

        tx.commit().await?;
        Ok(RegisterOutcome::Registered {
            competitor,
            tournament,
        })
    }

    async fn withdraw_competitor(
        &self,
        tournament_id: Uuid,
        competitor_id: Uuid,
    ) -> StoreResult<WithdrawOutcome> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            r#"
            UPDATE tournaments
            SET competitor = array_remove(competitor, $2),
                number_of_players = number_of_players - 1
            WHERE id = $1 AND $2 = ANY(competitor)
            RETURNING {TOURNAMENT_COLUMNS}
            "#
        ))
        .bind(tournament_id)
        .bind(competitor_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(row) = row else {
            return Ok(WithdrawOutcome::NotRegistered);
        };
        let tournament = tournament_from_row(&row)?;

        sqlx::query("DELETE FROM competitors WHERE id = $1")
            .bind(competitor_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(WithdrawOutcome::Withdrawn(tournament))
    }
}

#[async_trait]
impl CompetitorStore for PgStore {
    async fn find_competitor(&self, id: Uuid) -> StoreResult<Option<Competitor>> {
        let row = sqlx::query(&format!(
            "SELECT {COMPETITOR_COLUMNS} FROM competitors WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(competitor_from_row).transpose()?)
    }

    async fn find_competitors(&self, ids: &[Uuid]) -> StoreResult<Vec<Competitor>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query(&format!(
            "SELECT {COMPETITOR_COLUMNS} FROM competitors WHERE id = ANY($1)"
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(map_rows(rows, competitor_from_row)?)
    }

    async fn find_registration(
        &self,
        tournament_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<Competitor>> {
        let row = sqlx::query(&format!(
            "SELECT {COMPETITOR_COLUMNS} FROM competitors WHERE tournament_id = $1 AND user_id = $2"
        ))
        .bind(tournament_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(competitor_from_row).transpose()?)
    }
}

#[async_trait]
impl MatchStore for PgStore {
    async fn create_match(&self, game: NewMatch) -> StoreResult<Match> {
        schema(game.validate())?;
        let m = game.into_match();
        let row = sqlx::query(&format!(
            "INSERT INTO matches ({MATCH_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {MATCH_COLUMNS}"
        ))
        .bind(m.id)
        .bind(m.tournament_id)
        .bind(m.team_a)
        .bind(m.team_b)
        .bind(m.scheduled_at)
        .bind(m.status.as_str())
        .bind(m.score.a)
        .bind(m.score.b)
        .bind(m.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(match_from_row(&row)?)
    }

    async fn find_match(&self, id: Uuid) -> StoreResult<Option<Match>> {
        let row = sqlx::query(&format!("SELECT {MATCH_COLUMNS} FROM matches WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(match_from_row).transpose()?)
    }

    async fn list_matches(&self, filter: &MatchFilter, window: Window) -> StoreResult<Paged<Match>> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM matches WHERE 1=1");
        push_match_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::new(format!("SELECT {MATCH_COLUMNS} FROM matches WHERE 1=1"));
        push_match_filter(&mut query, filter);
        query.push(" ORDER BY scheduled_at ASC NULLS LAST, created_at DESC");
        push_window(&mut query, window);
        let rows = query.build().fetch_all(&self.pool).await?;

        Ok(Paged {
            items: map_rows(rows, match_from_row)?,
            total: total as u64,
        })
    }

    async fn update_match(&self, id: Uuid, update: MatchUpdate) -> StoreResult<Option<Match>> {
        schema(update.validate())?;
        let row = sqlx::query(&format!(
            r#"
            UPDATE matches
            SET tournament_id = COALESCE($2, tournament_id),
                team_a = COALESCE($3, team_a),
                team_b = COALESCE($4, team_b),
                scheduled_at = COALESCE($5, scheduled_at),
                status = COALESCE($6, status),
                score_a = COALESCE($7, score_a),
                score_b = COALESCE($8, score_b)
            WHERE id = $1
            RETURNING {MATCH_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(update.tournament_id)
        .bind(update.team_a)
        .bind(update.team_b)
        .bind(update.scheduled_at)
        .bind(update.status.map(MatchStatus::as_str))
        .bind(update.score.map(|s| s.a))
        .bind(update.score.map(|s| s.b))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(match_from_row).transpose()?)
    }

    async fn delete_match(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM matches WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl NewsStore for PgStore {
    async fn create_news(&self, news: NewNews) -> StoreResult<News> {
        schema(news.validate())?;
        let n = news.into_news();
        let row = sqlx::query(&format!(
            "INSERT INTO news ({NEWS_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {NEWS_COLUMNS}"
        ))
        .bind(n.id)
        .bind(&n.title)
        .bind(&n.content)
        .bind(n.author_id)
        .bind(n.tournament_id)
        .bind(&n.images)
        .bind(n.status.as_str())
        .bind(n.published_at)
        .bind(n.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(news_from_row(&row)?)
    }

    async fn find_news(&self, id: Uuid) -> StoreResult<Option<News>> {
        let row = sqlx::query(&format!("SELECT {NEWS_COLUMNS} FROM news WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.as_ref().map(news_from_row).transpose()?)
    }

    async fn list_news(&self, filter: &NewsFilter, window: Window) -> StoreResult<Paged<News>> {
        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM news WHERE 1=1");
        push_news_filter(&mut count, filter);
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut query = QueryBuilder::new(format!("SELECT {NEWS_COLUMNS} FROM news WHERE 1=1"));
        push_news_filter(&mut query, filter);
        query.push(" ORDER BY published_at DESC NULLS LAST, created_at DESC");
        push_window(&mut query, window);
        let rows = query.build().fetch_all(&self.pool).await?;

        Ok(Paged {
            items: map_rows(rows, news_from_row)?,
            total: total as u64,
        })
    }

    async fn update_news(&self, id: Uuid, update: NewsUpdate) -> StoreResult<Option<News>> {
        schema(update.validate())?;
        let row = sqlx::query(&format!(
            r#"
            UPDATE news
            SET title = COALESCE($2, title),
                content = COALESCE($3, content),
                tournament_id = COALESCE($4, tournament_id),
                images = COALESCE($5, images),
                status = COALESCE($6, status),
                published_at = COALESCE($7, published_at)
            WHERE id = $1
            RETURNING {NEWS_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&update.title)
        .bind(&update.content)
        .bind(update.tournament_id)
        .bind(&update.images)
        .bind(update.status.map(NewsStatus::as_str))
        .bind(update.published_at)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(news_from_row).transpose()?)
    }

    async fn delete_news(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM news WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}
