//! Contract ABI Bindings - Factory, Market, and Oracle Interfaces
//!
//! `sol!`-generated types covering exactly the events and view
//! functions the engine consumes. The upstream contract surface is
//! fixed and external; only the subset used off-chain is declared.

use alloy::sol;

sol! {
    /// Deploys market contracts and records them for enumeration.
    contract MarketFactory {
        event MarketCreated(
            address indexed market,
            address indexed creator,
            string question,
            uint256 endTime
        );

        function getAllMarkets() external view returns (address[] memory);
    }

    /// One binary-outcome prediction market instance.
    contract PredictionMarket {
        event SharesPurchased(
            address indexed buyer,
            bool isYes,
            uint256 investmentAmount,
            uint256 sharesReceived,
            uint256 yesPrice,
            uint256 noPrice
        );

        event MarketResolved(bool outcome, uint256 timestamp);

        function marketInfo()
            external
            view
            returns (
                string memory question,
                string memory description,
                uint256 endTime,
                uint8 state,
                address creator,
                bool requiresVerification,
                uint256 totalVolume,
                uint256 totalTraders
            );

        function getYesPrice() external view returns (uint256);

        function getNoPrice() external view returns (uint256);

        function getPoolInfo()
            external
            view
            returns (uint256 yesShares, uint256 noShares, uint256 liquidity);

        function getUserBalance(address user)
            external
            view
            returns (uint256 yes, uint256 no);
    }

    /// Privileged resolution oracle in front of the markets.
    contract ResolutionOracle {
        function resolveMarket(address market, bool outcome) external;

        function submitResolution(address market, bool outcome) external;
    }
}
