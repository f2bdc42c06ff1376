//! SQS integration tests against a running CloudMock server.

#[cfg(test)]
mod tests {
    use crate::{sqs_client, unique_name};

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_send_and_receive_message() {
        let client = sqs_client();
        let queue_name = unique_name("queue");

        let queue_url = client
            .create_queue()
            .queue_name(&queue_name)
            .send()
            .await
            .unwrap()
            .queue_url()
            .unwrap()
            .to_owned();
        assert!(queue_url.ends_with(&format!("/{queue_name}")));

        let sent = client
            .send_message()
            .queue_url(&queue_url)
            .message_body("hello")
            .send()
            .await
            .unwrap();
        assert_eq!(
            sent.md5_of_message_body(),
            Some("5d41402abc4b2a76b9719d911017c592")
        );

        let received = client
            .receive_message()
            .queue_url(&queue_url)
            .max_number_of_messages(1)
            .send()
            .await
            .unwrap();
        let messages = received.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].body(), Some("hello"));

        client
            .delete_message()
            .queue_url(&queue_url)
            .receipt_handle(messages[0].receipt_handle().unwrap())
            .send()
            .await
            .unwrap();

        client.delete_queue().queue_url(&queue_url).send().await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_list_queues_by_prefix() {
        let client = sqs_client();
        let queue_name = unique_name("listed");
        let queue_url = client
            .create_queue()
            .queue_name(&queue_name)
            .send()
            .await
            .unwrap()
            .queue_url()
            .unwrap()
            .to_owned();

        let resp = client
            .list_queues()
            .queue_name_prefix(&queue_name)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.queue_urls(), [queue_url.clone()]);

        client.delete_queue().queue_url(&queue_url).send().await.unwrap();
    }

    #[tokio::test]
    #[ignore = "requires running server"]
    async fn test_should_fail_to_resolve_missing_queue() {
        let client = sqs_client();
        let err = client
            .get_queue_url()
            .queue_name(unique_name("ghost"))
            .send()
            .await
            .unwrap_err();
        assert!(err.into_service_error().is_queue_does_not_exist());
    }
}
