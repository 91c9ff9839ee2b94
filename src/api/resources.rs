//! Named endpoints of the data API, grouped by dashboard area.

use reqwest::Method;

use super::{ApiClient, ApiError, Tag, TagKind, cache_key};
use crate::models::{
    AnalyticsParams, AnalyticsResponse, BanRequest, BanResponse, ChangePasswordRequest,
    CreateChallengeRequest, CreateChallengeResponse, DashboardOverview, ErrorDetail,
    LeaderboardResponse, LevelRequest, MathLevel, MathLevelsResponse, ModerationParams,
    ModerationResponse, PageParams, PointAdjustment, PointAdjustmentUpdate, Profile, Question,
    QuestionGenerationRequest, QuestionGenerationResponse, QuestionListResponse,
    QuestionUpdateRequest, Subject, SupportConversationList, SupportMessages, SupportReply,
    UpdateProfileRequest, UpdateProfileResponse, UserFilter, UsersResponse,
};

impl ApiClient {
    // --- Users ---

    /// User-management listing. Tagged with the listing and every user on the page,
    /// so invalidating one user refreshes any page showing them.
    pub async fn users(&self, filter: &UserFilter) -> Result<UsersResponse, ApiError> {
        let path = "/admin-api/user-management/";
        let mut params = vec![("page", filter.page.unwrap_or(1).to_string())];
        if let Some(search) = filter.search.as_deref().filter(|s| !s.is_empty()) {
            params.push(("search", search.to_string()));
        }
        if let Some(role) = &filter.role {
            params.push(("role", role.clone()));
        }
        if let Some(is_banned) = filter.is_banned {
            params.push(("is_banned", is_banned.to_string()));
        }

        let builder = self.request(Method::GET, path).query(&params);
        self.query(cache_key(path, &params), builder, |page: &UsersResponse| {
            std::iter::once(Tag::list(TagKind::User))
                .chain(
                    page.results
                        .iter()
                        .map(|user| Tag::with_id(TagKind::User, user.id.clone())),
                )
                .collect()
        })
        .await
    }

    // --- Dashboard Overview ---

    pub async fn overview(&self) -> Result<DashboardOverview, ApiError> {
        self.call(self.request(Method::GET, "/admin-api/overview/"))
            .await
    }

    // --- Analytics ---

    pub async fn analytics(&self, params: &AnalyticsParams) -> Result<AnalyticsResponse, ApiError> {
        let path = "/admin-api/analytics/";
        let mut query = vec![("page", params.page.unwrap_or(1).to_string())];
        if let Some(year) = params.year {
            query.push(("year", year.to_string()));
        }

        let builder = self.request(Method::GET, path).query(&query);
        self.query(cache_key(path, &query), builder, |_| {
            vec![Tag::of(TagKind::Analytics)]
        })
        .await
    }

    // --- Leaderboard ---

    pub async fn leaderboard(&self) -> Result<LeaderboardResponse, ApiError> {
        let path = "/admin-api/leaderboard/";
        self.query(path.to_string(), self.request(Method::GET, path), |_| {
            vec![Tag::of(TagKind::Leaderboard)]
        })
        .await
    }

    // --- Moderation ---

    pub async fn moderation(
        &self,
        params: &ModerationParams,
    ) -> Result<ModerationResponse, ApiError> {
        let path = "/admin-api/moderation/";
        let query = vec![
            ("page", params.page.unwrap_or(1).to_string()),
            ("filter", params.filter.clone().unwrap_or_else(|| "all".into())),
        ];

        let builder = self.request(Method::GET, path).query(&query);
        self.query(cache_key(path, &query), builder, |_| {
            vec![Tag::of(TagKind::Moderation)]
        })
        .await
    }

    pub async fn ban_user(&self, user_id: &str) -> Result<BanResponse, ApiError> {
        self.set_ban("/admin-api/ban/", user_id).await
    }

    pub async fn unban_user(&self, user_id: &str) -> Result<BanResponse, ApiError> {
        self.set_ban("/admin-api/unban/", user_id).await
    }

    /// Ban state shows up in the moderation queue and in every user listing
    /// containing that user, so both are invalidated.
    async fn set_ban(&self, path: &str, user_id: &str) -> Result<BanResponse, ApiError> {
        let body = BanRequest {
            user_id: user_id.to_string(),
        };
        self.mutate(
            self.request(Method::POST, path).json(&body),
            &[
                Tag::of(TagKind::Moderation),
                Tag::with_id(TagKind::User, user_id),
            ],
        )
        .await
    }

    // --- Challenges & Question Generation ---

    /// Subjects (math levels) a challenge can target.
    pub async fn subjects(&self) -> Result<Vec<Subject>, ApiError> {
        let path = "/auth/levels/";
        self.query(path.to_string(), self.request(Method::GET, path), |_| {
            vec![Tag::of(TagKind::Level)]
        })
        .await
    }

    pub async fn generate_questions(
        &self,
        body: &QuestionGenerationRequest,
    ) -> Result<QuestionGenerationResponse, ApiError> {
        // Every call produces a fresh batch, so nothing is cached or invalidated.
        self.call(
            self.request(Method::POST, "/admin-api/question-generation/")
                .json(body),
        )
        .await
    }

    pub async fn create_challenge(
        &self,
        body: &CreateChallengeRequest,
    ) -> Result<CreateChallengeResponse, ApiError> {
        self.mutate(
            self.request(Method::POST, "/admin-api/create-challenge/")
                .json(body),
            &[Tag::of(TagKind::Moderation)],
        )
        .await
    }

    // --- Questions ---

    pub async fn questions(&self, challenge_id: &str) -> Result<QuestionListResponse, ApiError> {
        let path = format!("/admin-api/question-list/{challenge_id}/");
        let builder = self.request(Method::GET, &path);
        self.query(path, builder, |_| vec![Tag::of(TagKind::Question)])
            .await
    }

    pub async fn update_question(
        &self,
        id: &str,
        body: &QuestionUpdateRequest,
    ) -> Result<Question, ApiError> {
        self.mutate(
            self.request(Method::PATCH, &format!("/admin-api/question-update/{id}/"))
                .json(body),
            &[Tag::of(TagKind::Question)],
        )
        .await
    }

    pub async fn delete_question(&self, id: &str) -> Result<(), ApiError> {
        self.mutate(
            self.request(Method::DELETE, &format!("/admin-api/question-delete/{id}/")),
            &[Tag::of(TagKind::Question)],
        )
        .await
    }

    // --- Support Inbox ---

    pub async fn support_conversations(
        &self,
        params: &PageParams,
    ) -> Result<SupportConversationList, ApiError> {
        let path = "/admin-api/support-message/";
        let query = vec![("page", params.page.unwrap_or(1).to_string())];
        let builder = self.request(Method::GET, path).query(&query);
        self.query(cache_key(path, &query), builder, |_| {
            vec![Tag::of(TagKind::Conversation)]
        })
        .await
    }

    pub async fn support_messages(
        &self,
        conversation_id: &str,
    ) -> Result<SupportMessages, ApiError> {
        let path = format!("/admin-api/support-message/{conversation_id}/");
        let builder = self.request(Method::GET, &path);
        self.query(path, builder, |_| vec![Tag::of(TagKind::Conversation)])
            .await
    }

    pub async fn reply_to_support(
        &self,
        conversation_id: &str,
        message: &str,
    ) -> Result<SupportReply, ApiError> {
        let body = SupportReply {
            message: message.to_string(),
        };
        self.mutate(
            self.request(
                Method::POST,
                &format!("/admin-api/support-message-reply/{conversation_id}/"),
            )
            .json(&body),
            &[Tag::of(TagKind::Conversation)],
        )
        .await
    }

    // --- Profile & Settings ---

    pub async fn profile(&self) -> Result<Profile, ApiError> {
        let path = "/admin-api/profile/";
        self.query(path.to_string(), self.request(Method::GET, path), |_| {
            vec![Tag::of(TagKind::Profile)]
        })
        .await
    }

    pub async fn update_profile(
        &self,
        body: &UpdateProfileRequest,
    ) -> Result<UpdateProfileResponse, ApiError> {
        self.mutate(
            self.request(Method::PATCH, "/admin-api/profile/").json(body),
            &[Tag::of(TagKind::Profile)],
        )
        .await
    }

    pub async fn change_password(
        &self,
        body: &ChangePasswordRequest,
    ) -> Result<ErrorDetail, ApiError> {
        self.call(
            self.request(Method::PATCH, "/admin-api/update-password/")
                .json(body),
        )
        .await
    }

    pub async fn math_levels(&self) -> Result<MathLevelsResponse, ApiError> {
        let path = "/admin-api/level-adjustment/";
        self.query(path.to_string(), self.request(Method::GET, path), |_| {
            vec![Tag::of(TagKind::Level)]
        })
        .await
    }

    pub async fn create_math_level(&self, name: &str) -> Result<MathLevel, ApiError> {
        let body = LevelRequest {
            name: name.to_string(),
        };
        self.mutate(
            self.request(Method::POST, "/admin-api/level-adjustment/")
                .json(&body),
            &[Tag::of(TagKind::Level)],
        )
        .await
    }

    pub async fn rename_math_level(&self, id: &str, name: &str) -> Result<MathLevel, ApiError> {
        let body = LevelRequest {
            name: name.to_string(),
        };
        self.mutate(
            self.request(Method::PATCH, &format!("/admin-api/level-adjustment/{id}/"))
                .json(&body),
            &[Tag::of(TagKind::Level)],
        )
        .await
    }

    // --- Point Adjustment ---

    pub async fn point_adjustment(&self) -> Result<PointAdjustment, ApiError> {
        let path = "/admin-api/point-adjustment/";
        self.query(path.to_string(), self.request(Method::GET, path), |_| {
            vec![Tag::of(TagKind::PointAdjustment)]
        })
        .await
    }

    pub async fn update_point_adjustment(
        &self,
        body: &PointAdjustmentUpdate,
    ) -> Result<PointAdjustment, ApiError> {
        self.mutate(
            self.request(Method::PATCH, "/admin-api/point-adjustment/")
                .json(body),
            &[Tag::of(TagKind::PointAdjustment)],
        )
        .await
    }
}
