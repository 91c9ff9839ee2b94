use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};

// --- Identity Payloads ---

/// LoginRequest
///
/// Credentials forwarded to the identity API. The password is never logged or stored.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginRequest {
    #[schema(example = "admin@mathos.cloud")]
    pub email: String,
    pub password: String,
}

/// LoginResponse
///
/// Token pair issued by the identity API at login.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginResponse {
    pub access: String,
    pub refresh: String,
}

/// Body of the refresh exchange sent upstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRefreshRequest {
    pub refresh: String,
}

/// Body of a successful refresh exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRefreshResponse {
    pub access: String,
}

/// ErrorDetail
///
/// The identity API's failure body, also returned by the login endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ErrorDetail {
    pub detail: String,
}

/// Query string of `GET /api/generateToken`.
#[derive(Debug, Clone, Deserialize, IntoParams, Default)]
#[into_params(parameter_in = Query)]
pub struct RefreshParams {
    /// Path (with query) to return to once the access token is renewed.
    pub redirect: Option<String>,
}

// --- Shared Query Parameters ---

/// Page selector shared by the paginated admin listings.
#[derive(Debug, Clone, Serialize, Deserialize, IntoParams, Default)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    pub page: Option<u32>,
}

/// UserFilter
///
/// Filters for the user-management listing. `None` means "all".
#[derive(Debug, Clone, Serialize, Deserialize, IntoParams, Default)]
#[into_params(parameter_in = Query)]
pub struct UserFilter {
    pub page: Option<u32>,
    pub search: Option<String>,
    /// `student` or `teacher`.
    pub role: Option<String>,
    pub is_banned: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, IntoParams, Default)]
#[into_params(parameter_in = Query)]
pub struct AnalyticsParams {
    pub page: Option<u32>,
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, IntoParams, Default)]
#[into_params(parameter_in = Query)]
pub struct ModerationParams {
    pub page: Option<u32>,
    /// Upstream filter keyword; `all` when omitted.
    pub filter: Option<String>,
}

// --- Users ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct User {
    pub id: String,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub is_banned: bool,
    pub date_joined: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UsersResponse {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<User>,
}

// --- Dashboard Overview ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RecentActivity {
    pub id: String,
    pub title: String,
    pub message: String,
    pub affector_name: String,
    pub user_type: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct DashboardOverview {
    pub total_user: u64,
    pub total_student: u64,
    pub total_teacher: u64,
    pub total_active_user: u64,
    pub total_banned_user: u64,
    pub recent_activities: Vec<RecentActivity>,
}

// --- Analytics ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AnalyticsSummary {
    pub total_users: u64,
    pub active_users: u64,
    pub total_challenges: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UsageAnalytics {
    pub month: String,
    pub users: u64,
    pub engagement: f64,
    pub activity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct EngagementUser {
    pub no: u64,
    pub id: String,
    pub name: String,
    pub role: String,
    pub profile_pic: Option<String>,
    pub challenges: u64,
    pub engagement_score: f64,
    pub last_active: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct StudentEngagement {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<EngagementUser>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AnalyticsResponse {
    pub summary: AnalyticsSummary,
    pub available_years: Vec<i32>,
    pub selected_year: i32,
    pub usage_analytics: Vec<UsageAnalytics>,
    pub student_engagement: StudentEngagement,
}

// --- Leaderboard ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LeaderboardUser {
    pub rank: u64,
    pub user_id: String,
    pub username: String,
    pub profile_pic: Option<String>,
    pub level: u64,
    pub total_points: i64,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LeaderboardResponse {
    pub count: u64,
    pub results: Vec<LeaderboardUser>,
}

// --- Moderation ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ModerationTopStats {
    pub total_user: u64,
    pub total_active_user: u64,
    pub total_post: u64,
    pub total_challenge: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ModerationUser {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub is_banned: bool,
    pub warning: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ModerationResponse {
    pub top: ModerationTopStats,
    pub users: Vec<ModerationUser>,
}

/// Body of both ban and unban requests.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct BanRequest {
    pub user_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct BanResponse {
    pub msg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// --- Challenges & Question Generation ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Subject {
    pub id: String,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct GeneratedQuestion {
    pub number: u32,
    pub question: String,
    pub answer: String,
}

/// QuestionGenerationRequest
///
/// Field spellings follow the upstream contract verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct QuestionGenerationRequest {
    pub dificulty_level: u32,
    pub subject: String,
    pub number_of_question: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct QuestionGenerationResponse {
    pub grade: String,
    pub subject: String,
    pub count: u32,
    pub questions: Vec<GeneratedQuestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ChallengeQuestion {
    pub order: u32,
    pub question_text: String,
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateChallengeRequest {
    pub name: String,
    pub description: String,
    pub subject: String,
    pub grade: u32,
    pub points: u32,
    pub publishing_date: String,
    pub questions: Vec<ChallengeQuestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateChallengeResponse {
    pub id: String,
    pub message: String,
}

// --- Questions ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct Question {
    pub id: String,
    pub order: u32,
    pub question_text: String,
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct QuestionListResponse {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<Question>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct QuestionUpdateRequest {
    pub order: u32,
    pub question_text: String,
    pub answer: String,
}

// --- Support Inbox ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SupportConversation {
    pub id: String,
    pub user_name: String,
    pub user_role: String,
    pub is_closed: bool,
    pub created_at: String,
    pub last_message: String,
    pub last_message_time: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SupportConversationList {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<SupportConversation>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SupportMessage {
    pub id: String,
    pub sender_name: String,
    pub sender_role: String,
    pub message: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SupportMessages {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<SupportMessage>,
}

/// Used for both the reply request and its acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SupportReply {
    pub message: String,
}

// --- Profile & Settings ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct Profile {
    pub first_name: String,
    pub last_name: String,
    pub profile_pic: Option<String>,
}

/// Partial profile update; absent fields are left untouched upstream.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateProfileRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

/// UpdateProfileResponse
///
/// Upstream re-issues the access token after a profile change, since the name
/// is embedded in its claims.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateProfileResponse {
    pub first_name: String,
    pub last_name: String,
    pub profile_pic: Option<String>,
    pub access_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct MathLevel {
    pub id: String,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct MathLevelsResponse {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<MathLevel>,
}

/// Create and rename share one body.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LevelRequest {
    pub name: String,
}

// --- Point Adjustment ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PointAdjustment {
    pub id: String,
    pub classroom_point: i64,
    pub upvote_point: i64,
    pub daily_challenge_point: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct PointAdjustmentUpdate {
    pub classroom_point: i64,
    pub upvote_point: i64,
    pub daily_challenge_point: i64,
}
