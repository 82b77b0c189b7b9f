use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{
    ActivityId, ActivityKind, CommentSort, ImportId, ImportStatus, ListKind, MediaKind,
    MessageId, MessageKind, RequestId, RequestStatus, ShowId, UserId, Visibility,
};

// -- JWT Claims --

/// Bearer token claims. Shared by token issuance and the auth middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub sub: UserId,
    pub email: String,
    pub display_name: String,
    pub exp: usize,
}

#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
    pub display_name: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub user_id: UserId,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user_id: UserId,
    pub display_name: String,
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub email: String,
    pub display_name: String,
}

// -- Shows --

/// A reference to a catalog entry as submitted by clients. Display fields are
/// optional; the first request that supplies them wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShowRef {
    pub tmdb_id: i64,
    pub media_kind: MediaKind,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub first_air_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Show {
    pub id: ShowId,
    pub tmdb_id: i64,
    pub media_kind: MediaKind,
    pub title: String,
    pub poster_path: Option<String>,
    pub release_date: Option<String>,
    pub first_air_date: Option<String>,
}

// -- Lists --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AddToListRequest {
    pub show_ref: ShowRef,
    pub list_kind: ListKind,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToListResponse {
    pub success: bool,
    pub list: ListKind,
    pub show: Show,
    pub already_member: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MoveToListRequest {
    pub show_ref: ShowRef,
    pub from_list: ListKind,
    pub to_list: ListKind,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveToListResponse {
    pub success: bool,
    pub from_list: ListKind,
    pub to_list: ListKind,
    pub show: Show,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RemoveFromListRequest {
    pub show_ref: ShowRef,
    pub list_kind: ListKind,
}

#[derive(Debug, Serialize)]
pub struct RemoveFromListResponse {
    pub success: bool,
    pub removed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListEntry {
    pub list: ListKind,
    pub show: Show,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ListStatusResponse {
    pub list: Option<ListKind>,
}

// -- Friends --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FriendRequestBody {
    pub user_id: UserId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendRequest {
    pub id: RequestId,
    pub from_user_id: UserId,
    pub from_display_name: String,
    pub to_user_id: UserId,
    pub to_display_name: String,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct SendFriendRequestResponse {
    pub success: bool,
    pub request: FriendRequest,
}

#[derive(Debug, Serialize)]
pub struct PendingRequestsResponse {
    pub incoming: Vec<FriendRequest>,
    pub outgoing: Vec<FriendRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Friend {
    pub id: UserId,
    pub display_name: String,
    pub since: DateTime<Utc>,
}

// -- Messages --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SendMessageRequest {
    pub receiver_id: UserId,
    pub text: String,
    #[serde(default)]
    pub kind: MessageKind,
    #[serde(default)]
    pub show: Option<ShowRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub sender_id: UserId,
    pub receiver_id: UserId,
    pub kind: MessageKind,
    pub body: String,
    pub show: Option<Show>,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub success: bool,
    pub message: Message,
}

#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    pub messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    pub success: bool,
    pub marked: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCount {
    pub sender_id: UserId,
    pub sender_name: String,
    pub count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalUnreadResponse {
    pub total: i64,
    pub messages: i64,
    pub friend_requests: i64,
}

// -- Reviews --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ReviewRequest {
    pub show: ShowRef,
    pub rating: i64,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub rewatch: bool,
    #[serde(default)]
    pub spoiler: bool,
    #[serde(default)]
    pub visibility: Visibility,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i64,
    pub user_id: UserId,
    pub show: Show,
    pub rating: i64,
    pub comment: Option<String>,
    pub tags: Vec<String>,
    pub rewatch: bool,
    pub spoiler: bool,
    pub visibility: Visibility,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    pub success: bool,
    pub created: bool,
    pub review: Review,
}

// -- Activity --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreatePostRequest {
    pub content: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub show: Option<ShowRef>,
}

/// A durable activity row with its overlay counts filled in at read time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    pub id: ActivityId,
    pub actor_id: UserId,
    pub actor_name: String,
    pub kind: ActivityKind,
    pub action: String,
    pub show: Option<Show>,
    pub rating: Option<i64>,
    pub comment: Option<String>,
    pub visibility: Visibility,
    pub created_at: DateTime<Utc>,
    pub like_count: usize,
    pub comment_count: usize,
    pub liked_by_me: bool,
}

#[derive(Debug, Serialize)]
pub struct CreatePostResponse {
    pub success: bool,
    pub post: Activity,
}

#[derive(Debug, Default, Deserialize)]
pub struct OverlayQuery {
    #[serde(default)]
    pub sort: CommentSort,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddCommentRequest {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: u64,
    pub author_id: UserId,
    pub author_name: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
    pub like_count: usize,
    pub liked_by_me: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayView {
    pub activity_id: ActivityId,
    pub like_count: usize,
    pub liked_by_me: bool,
    pub comment_count: usize,
    pub comments: Vec<CommentView>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleLikeResponse {
    pub liked: bool,
    pub like_count: usize,
}

// -- Imports --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ImportTextRequest {
    pub text: String,
    /// List used for any confirmed choice that does not name its own.
    #[serde(default)]
    pub list_type: Option<ListKind>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub original_filename: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSession {
    pub import_id: ImportId,
    pub status: ImportStatus,
    pub source: String,
    pub original_filename: Option<String>,
    pub default_list: Option<ListKind>,
    pub total_titles: i64,
    pub matched_count: i64,
    pub unmatched_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedTitle {
    pub id: i64,
    pub raw_text: String,
    pub normalized_title: String,
    pub year: Option<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportDetail {
    #[serde(flatten)]
    pub session: ImportSession,
    pub titles: Vec<ExtractedTitle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ImportChoiceRequest {
    pub extracted_title_id: i64,
    pub show: ShowRef,
    #[serde(default)]
    pub list_type: Option<ListKind>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfirmImportRequest {
    pub import_id: ImportId,
    pub choices: Vec<ImportChoiceRequest>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChoiceStatus {
    Added,
    AlreadyMember,
    /// The show already sits in another list; nothing was changed.
    Conflict,
    Invalid,
}

/// What happened to one confirmed choice. Fields that do not apply to the
/// status are left out of the JSON.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceResult {
    pub extracted_title_id: i64,
    pub status: ChoiceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list: Option<ListKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_list: Option<ListKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show: Option<Show>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmImportResponse {
    pub success: bool,
    pub session: ImportSession,
    pub results: Vec<ChoiceResult>,
}
