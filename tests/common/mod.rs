use constcat::concat;
use ivent_backend::api;
use reqwest::StatusCode;
use serde_json::json;

const BASE_URL: &str = "http://localhost:3000";

/// Email that no other test run has registered.
pub fn unique_email(prefix: &str) -> String {
    format!("{prefix}-{}@test.local", uuid::Uuid::new_v4())
}

pub struct Client {
    inner: reqwest::Client,
    pub auth_token: Option<String>,
}

impl Client {
    pub fn new() -> Self {
        Self {
            inner: reqwest::Client::new(),
            auth_token: None,
        }
    }

    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<api::User, StatusCode> {
        const URL: &str = concat!(BASE_URL, "/register");

        Ok(self
            .inner
            .post(URL)
            .json(&json!({
                "email": email,
                "password": password,
                "name": name,
            }))
            .send()
            .await
            .expect("failed to send a request")
            .error_for_status()
            .map_err(|e| e.status().expect("status error"))?
            .json::<api::User>()
            .await
            .expect("failed to get a response"))
    }

    pub async fn auth(mut self, email: &str, password: &str) -> Self {
        self.auth_token = Some(
            self.try_auth(email, password)
                .await
                .expect("failed to authenticate"),
        );

        self
    }

    pub async fn try_auth(
        &self,
        email: &str,
        password: &str,
    ) -> Result<String, StatusCode> {
        const URL: &str = concat!(BASE_URL, "/auth");

        Ok(self
            .inner
            .post(URL)
            .json(&json!({
                "email": email,
                "password": password,
            }))
            .send()
            .await
            .expect("failed to send a request")
            .error_for_status()
            .map_err(|e| e.status().expect("status error"))?
            .text()
            .await
            .expect("failed to get a response"))
    }

    pub async fn user(&self) -> Result<api::User, StatusCode> {
        const URL: &str = concat!(BASE_URL, "/user");

        let mut req = self.inner.get(URL);
        if let Some(token) = &self.auth_token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }
        Ok(req
            .send()
            .await
            .expect("failed to send a request")
            .error_for_status()
            .map_err(|e| e.status().expect("status error"))?
            .json::<api::User>()
            .await
            .expect("failed to get a response"))
    }

    pub async fn list_events(&self) -> Result<api::event::List, StatusCode> {
        const URL: &str = concat!(BASE_URL, "/event");

        Ok(self
            .inner
            .get(URL)
            .send()
            .await
            .expect("failed to send a request")
            .error_for_status()
            .map_err(|e| e.status().expect("status error"))?
            .json::<api::event::List>()
            .await
            .expect("failed to get a response"))
    }

    pub async fn get_event(
        &self,
        id: api::event::Id,
    ) -> Result<api::event::Details, StatusCode> {
        const URL: &str = concat!(BASE_URL, "/event");

        Ok(self
            .inner
            .get(format!("{URL}/{id}"))
            .send()
            .await
            .expect("failed to send a request")
            .error_for_status()
            .map_err(|e| e.status().expect("status error"))?
            .json::<api::event::Details>()
            .await
            .expect("failed to get a response"))
    }

    pub async fn add_event(
        &self,
        title: &str,
        start_at: &str,
    ) -> Result<api::Event, StatusCode> {
        const URL: &str = concat!(BASE_URL, "/event");

        let mut req = self.inner.post(URL);
        if let Some(token) = &self.auth_token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }
        Ok(req
            .json(&json!({
                "title": title,
                "description": "An event created by the test suite.",
                "city": "Zhytomyr",
                "location": "City Park",
                "category": "Music",
                "startAt": start_at,
            }))
            .send()
            .await
            .expect("failed to send a request")
            .error_for_status()
            .map_err(|e| e.status().expect("status error"))?
            .json::<api::Event>()
            .await
            .expect("failed to get a response"))
    }

    pub async fn delete_event(
        &self,
        id: api::event::Id,
    ) -> Result<(), StatusCode> {
        const URL: &str = concat!(BASE_URL, "/event");

        let mut req = self.inner.delete(format!("{URL}/{id}"));
        if let Some(token) = &self.auth_token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }
        req.send()
            .await
            .expect("failed to send a request")
            .error_for_status()
            .map_err(|e| e.status().expect("status error"))?;

        Ok(())
    }

    pub async fn add_ticket_type(
        &self,
        event_id: api::event::Id,
        name: &str,
        price: i64,
        total: usize,
    ) -> Result<api::TicketType, StatusCode> {
        const URL: &str = concat!(BASE_URL, "/event");

        let mut req = self.inner.post(format!("{URL}/{event_id}/ticket-type"));
        if let Some(token) = &self.auth_token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }
        Ok(req
            .json(&json!({
                "name": name,
                "price": price,
                "total": total,
            }))
            .send()
            .await
            .expect("failed to send a request")
            .error_for_status()
            .map_err(|e| e.status().expect("status error"))?
            .json::<api::TicketType>()
            .await
            .expect("failed to get a response"))
    }

    pub async fn add_review(
        &self,
        event_id: api::event::Id,
        rating: u8,
        text: &str,
    ) -> Result<api::Review, StatusCode> {
        const URL: &str = concat!(BASE_URL, "/event");

        let mut req = self.inner.post(format!("{URL}/{event_id}/review"));
        if let Some(token) = &self.auth_token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }
        Ok(req
            .json(&json!({
                "rating": rating,
                "text": text,
            }))
            .send()
            .await
            .expect("failed to send a request")
            .error_for_status()
            .map_err(|e| e.status().expect("status error"))?
            .json::<api::Review>()
            .await
            .expect("failed to get a response"))
    }

    pub async fn buy_tickets(
        &self,
        ticket_type_id: api::ticket_type::Id,
        quantity: usize,
    ) -> Result<api::order::Receipt, StatusCode> {
        const URL: &str = concat!(BASE_URL, "/order");

        let mut req = self.inner.post(URL);
        if let Some(token) = &self.auth_token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }
        Ok(req
            .json(&json!({
                "ticketTypeId": ticket_type_id,
                "quantity": quantity,
            }))
            .send()
            .await
            .expect("failed to send a request")
            .error_for_status()
            .map_err(|e| e.status().expect("status error"))?
            .json::<api::order::Receipt>()
            .await
            .expect("failed to get a response"))
    }

    pub async fn get_orders(&self) -> Result<api::order::List, StatusCode> {
        const URL: &str = concat!(BASE_URL, "/order");

        let mut req = self.inner.get(URL);
        if let Some(token) = &self.auth_token {
            req = req.header("Authorization", format!("Bearer {token}"));
        }
        Ok(req
            .send()
            .await
            .expect("failed to send a request")
            .error_for_status()
            .map_err(|e| e.status().expect("status error"))?
            .json::<api::order::List>()
            .await
            .expect("failed to get a response"))
    }

    pub async fn get_calendar(
        &self,
        month: Option<&str>,
    ) -> Result<api::calendar::Month, StatusCode> {
        const URL: &str = concat!(BASE_URL, "/calendar");

        let url = match month {
            Some(month) => format!("{URL}?month={month}"),
            None => URL.to_string(),
        };
        Ok(self
            .inner
            .get(url)
            .send()
            .await
            .expect("failed to send a request")
            .error_for_status()
            .map_err(|e| e.status().expect("status error"))?
            .json::<api::calendar::Month>()
            .await
            .expect("failed to get a response"))
    }
}
